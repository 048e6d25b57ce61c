//! Weighted finite-state transducer representation and algebra.
//!
//! A transducer is a directed graph whose states carry a final weight and
//! whose transitions carry an input label, an output label, a weight and a
//! destination state, with weights drawn from a semiring (see
//! `polku-weight`). This crate provides the capability traits, the
//! copy-on-write vector representation, the lazy (delayed) adapter used by
//! the rational operations, and the binary container format with its type
//! registry.
//!
//! # Architecture
//!
//! - [`transition`] -- The labeled, weighted transition (arc) tuple
//! - [`properties`] -- Structural property bitmask and transfer functions
//! - [`symbols`] -- Label/string symbol tables
//! - [`traits`] -- `Fst` / `ExpandedFst` / `MutableFst` capability traits
//! - [`iter`] -- State and transition cursors, including in-place mutation
//! - [`vector`] -- Copy-on-write mutable vector representation
//! - [`lazy`] -- Memoizing adapter backing the delayed operations
//! - [`closure`] -- Concatenative closure (destructive and delayed)
//! - [`invert`] -- Label inversion (destructive and delayed)
//! - [`complement`] -- Acceptor complementation (delayed)
//! - [`registry`] -- Explicit fst-type registry and polymorphic read
//! - [`io`] -- Binary container header and body encoding
//! - [`verify`] -- Structural validation diagnostic

pub mod closure;
pub mod complement;
pub mod invert;
pub mod io;
pub mod iter;
pub mod lazy;
pub mod properties;
pub mod registry;
pub mod symbols;
pub mod traits;
pub mod transition;
pub mod vector;
pub mod verify;

use polku_weight::WeightError;

pub use crate::closure::{ClosureFst, ClosureType, closure, closure_fst};
pub use crate::complement::{ComplementFst, RHO_LABEL, complement_fst};
pub use crate::invert::{InvertFst, invert, invert_fst};
pub use crate::io::{FstHeader, write_fst, write_fst_to_path};
pub use crate::iter::{ArcIter, MutArcIter, StateIter};
pub use crate::lazy::{ExpandedState, LazyFst, StateExpander};
pub use crate::registry::{FstRegistry, read_fst, read_mutable_fst};
pub use crate::symbols::SymbolTable;
pub use crate::traits::{ExpandedFst, Fst, MutableFst};
pub use crate::transition::{StdTransition, Transition};
pub use crate::vector::{VECTOR_FST_TYPE, VectorFst};
pub use crate::verify::verify;

/// Transition label. Non-negative; `0` is reserved for epsilon.
pub type Label = u32;

/// Dense state identifier, assigned at state creation.
pub type StateId = u32;

/// The reserved "no symbol" label for silent transitions.
pub const EPSILON: Label = 0;

/// Error type for transducer construction, validation and I/O.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Weight(#[from] WeightError),
    #[error("invalid magic number in {origin}")]
    BadMagic { origin: String },
    #[error("unsupported container version {version} in {origin}")]
    UnsupportedVersion { version: u32, origin: String },
    #[error("arc type mismatch in {origin}: expected {expected:?}, found {found:?}")]
    ArcTypeMismatch {
        expected: String,
        found: String,
        origin: String,
    },
    #[error("unknown fst type {fst_type:?} in {origin}")]
    UnknownFstType { fst_type: String, origin: String },
    #[error("{origin} does not hold a mutable fst")]
    NotMutable { origin: String },
    #[error("start state {state} is out of range")]
    BadStartState { state: StateId },
    #[error("transition from state {state} targets missing state {nextstate}")]
    DanglingTransition { state: StateId, nextstate: StateId },
    #[error("non-member weight at state {state}")]
    BadWeight { state: StateId },
    #[error("{operation} requires {required}")]
    IncompatibleFst {
        operation: &'static str,
        required: &'static str,
    },
}
