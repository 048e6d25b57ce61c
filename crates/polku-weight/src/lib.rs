//! Semiring weight algebra for the polku transducer library.
//!
//! Transducer arcs and final states carry weights drawn from a semiring
//! `(W, plus, times, zero, one)`. This crate provides the [`Semiring`]
//! contract, the concrete weight types, and the configurable text format
//! for composite (tuple-structured) weights.
//!
//! # Architecture
//!
//! - [`tropical`] -- Tropical semiring (min, +) over f32
//! - [`log`] -- Log semiring (log-add, +) over f32
//! - [`product`] -- Pair semiring combining two component semirings
//! - [`textio`] -- Composite-weight text reader/writer and its configuration

pub mod log;
pub mod product;
pub mod textio;
pub mod tropical;

mod float;

use std::fmt;
use std::io;
use std::str::FromStr;

use crate::textio::{CompositeWeightReader, CompositeWeightWriter};

pub use crate::log::LogWeight;
pub use crate::product::ProductWeight;
pub use crate::textio::WeightTextConfig;
pub use crate::tropical::TropicalWeight;

/// Error type for weight parsing and text-format configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeightError {
    #[error("invalid weight separator {0:?}: must be exactly one character")]
    BadSeparator(String),
    #[error("invalid weight parentheses {0:?}: must be empty or exactly two characters")]
    BadParentheses(String),
    #[error("open parenthesis missing before composite weight")]
    MissingOpenParen,
    #[error("close parenthesis missing after composite weight")]
    MissingCloseParen,
    #[error("separator missing between weight components")]
    MissingSeparator,
    #[error("empty weight component")]
    EmptyComponent,
    #[error("excess character {0:?} after weight")]
    TrailingGarbage(char),
    #[error("cannot parse weight from {0:?}")]
    Parse(String),
}

/// Default quantization delta for approximate weight equality.
pub const DELTA: f32 = 1.0 / 1024.0;

/// A semiring weight: two associative operations with identities, where
/// `times` distributes over `plus`.
///
/// Algorithms rely on these laws for correctness, so a type implementing
/// this trait with a non-associative `plus` or a non-distributing `times`
/// is defective by contract, not merely low quality.
///
/// Not every bit pattern of a weight type is a valid semiring element;
/// [`Semiring::is_member`] reports validity and operations on non-member
/// values must themselves yield non-member values rather than panic.
pub trait Semiring:
    Clone + PartialEq + fmt::Debug + fmt::Display + FromStr<Err = WeightError> + 'static
{
    /// The identity of `plus`. Also the final weight of a non-final state.
    fn zero() -> Self;

    /// The identity of `times`.
    fn one() -> Self;

    /// Semiring addition.
    fn plus(&self, rhs: &Self) -> Self;

    /// Semiring multiplication.
    fn times(&self, rhs: &Self) -> Self;

    /// Whether this value is a valid element of the semiring domain.
    fn is_member(&self) -> bool;

    /// Round to the nearest multiple of `delta`, leaving non-finite values
    /// untouched.
    fn quantize(&self, delta: f32) -> Self;

    /// Approximate equality within `delta`.
    fn approx_eq(&self, rhs: &Self, delta: f32) -> bool;

    /// Identifying name of the weight type, used as the arc-type tag in
    /// serialized transducer headers.
    fn type_name() -> String;

    /// Serialize in the fixed little-endian binary form.
    fn write_bytes<Wr: io::Write + ?Sized>(&self, w: &mut Wr) -> io::Result<()>;

    /// Deserialize from the fixed little-endian binary form.
    fn read_bytes<R: io::Read + ?Sized>(r: &mut R) -> io::Result<Self>;

    /// Write through a composite-weight writer. Leaf weights emit a single
    /// element; composite weights override this to recurse with the same
    /// writer so every nesting level shares one configuration.
    fn write_text<S: fmt::Write>(&self, w: &mut CompositeWeightWriter<S>) -> fmt::Result {
        w.write_element(self)
    }

    /// Read through a composite-weight reader. Mirror of
    /// [`Semiring::write_text`].
    fn read_text(r: &mut CompositeWeightReader) -> Result<Self, WeightError> {
        r.read_leaf()
    }
}
