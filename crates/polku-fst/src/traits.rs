// Capability traits: read-only, expanded, mutable.
//
// Algorithms are written against the smallest capability they need, so a
// delayed view and the eager vector representation are interchangeable
// wherever only `Fst` is required.

use std::io;

use polku_weight::Semiring;

use crate::iter::{ArcIter, MutArcIter, StateIter};
use crate::symbols::SymbolTable;
use crate::transition::Transition;
use crate::{FstError, StateId};

/// Read-only transducer access.
///
/// State accessors take any live StateId; passing an id outside the live
/// set panics with an index error. Implementations are usable as trait
/// objects (`dyn Fst<W = _>`), which is what the registry-driven read
/// entry points return.
pub trait Fst {
    type W: Semiring;

    /// The start state, or `None` when no start has been set.
    fn start(&self) -> Option<StateId>;

    /// The final weight of `state`; `zero` means non-final.
    fn final_weight(&self, state: StateId) -> Self::W;

    fn num_arcs(&self, state: StateId) -> usize;

    fn num_input_epsilons(&self, state: StateId) -> usize;

    fn num_output_epsilons(&self, state: StateId) -> usize;

    /// Property bits under `mask`. Bits are meaningful only where known
    /// (see [`crate::properties::known_properties`]); with `test` set,
    /// unknown trinary bits under the mask are resolved by a structural
    /// scan first.
    fn properties(&self, mask: u64, test: bool) -> u64;

    /// Tag identifying the concrete representation, the registry key.
    fn fst_type(&self) -> &'static str;

    fn input_symbols(&self) -> Option<&SymbolTable>;

    fn output_symbols(&self) -> Option<&SymbolTable>;

    /// Cursor over live StateIds in ascending order.
    fn states(&self) -> StateIter;

    /// Cursor over the transitions of `state`.
    fn arcs(&self, state: StateId) -> ArcIter<'_, Self::W>;

    /// Serialize into the binary container format. Representations
    /// without a persisted form keep the default, which fails.
    fn write(&self, _w: &mut dyn io::Write) -> Result<(), FstError> {
        Err(FstError::IncompatibleFst {
            operation: "write",
            required: "a representation with a persisted form",
        })
    }

    /// Copy this transducer. A plain copy (`safe = false`) shares the
    /// underlying representation until one holder mutates; a safe copy
    /// forks immediately and is independently usable from another thread
    /// of control.
    fn copy(&self, safe: bool) -> Self
    where
        Self: Sized;
}

/// A transducer that is fully instantiated: its state count is known and
/// every StateId in `[0, num_states())` may be queried.
pub trait ExpandedFst: Fst {
    fn num_states(&self) -> usize;
}

/// Construction and mutation on top of [`ExpandedFst`].
///
/// Every mutator honors the copy-on-write contract: when the underlying
/// representation is shared with another handle, the mutation forks a
/// private copy first, so no other holder ever observes it.
pub trait MutableFst: ExpandedFst {
    /// Set or clear the start state. The id must be live.
    fn set_start(&mut self, state: Option<StateId>);

    /// Set the final weight of `state`; `zero` marks it non-final.
    fn set_final(&mut self, state: StateId, weight: Self::W);

    /// Overwrite property bits under `mask`. Callers are responsible for
    /// only asserting facts that hold; this is the cache update hook for
    /// operations with a known transfer function.
    fn set_properties(&mut self, props: u64, mask: u64);

    /// Add a state and return its id. Ids are dense and stable until a
    /// deletion renumbers.
    fn add_state(&mut self) -> StateId;

    fn add_states(&mut self, n: usize);

    /// Append a transition to `state`, preserving insertion order.
    fn add_arc(&mut self, state: StateId, tr: Transition<Self::W>);

    /// Delete the given states, renumbering the survivors to stay dense
    /// (order preserved). Transitions into a deleted state are removed;
    /// a deleted start becomes no-start.
    fn delete_states(&mut self, states: &[StateId]);

    /// Remove every state. On a shared representation this installs a
    /// fresh empty one carrying over the symbol tables instead of
    /// deep-cloning first.
    fn delete_all_states(&mut self);

    /// Delete the final `n` transitions of `state`.
    fn delete_arcs(&mut self, state: StateId, n: usize);

    fn delete_all_arcs(&mut self, state: StateId);

    /// Capacity hint; best effort only.
    fn reserve_states(&mut self, _n: usize) {}

    /// Capacity hint; best effort only.
    fn reserve_arcs(&mut self, _state: StateId, _n: usize) {}

    fn set_input_symbols(&mut self, symbols: Option<SymbolTable>);

    fn set_output_symbols(&mut self, symbols: Option<SymbolTable>);

    fn input_symbols_mut(&mut self) -> Option<&mut SymbolTable>;

    fn output_symbols_mut(&mut self) -> Option<&mut SymbolTable>;

    /// Cursor over the transitions of `state` supporting in-place
    /// replacement. Conservatively marks the structural properties
    /// unknown, since the caller may rewrite any field.
    fn arcs_mut(&mut self, state: StateId) -> MutArcIter<'_, Self::W>;
}
