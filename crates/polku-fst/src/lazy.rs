// Memoizing adapter behind the delayed operations.
//
// A lazy transducer wraps a state expander and computes each state's final
// weight and transitions the first time that state is visited; re-visiting
// a cached state never re-invokes the expander. Conceptually each state
// moves Unvisited -> Expanding -> Cached, and only forward.
//
// Plain copies share the expander and the cache. Filling the cache is the
// only internal mutation and it sits behind a lock, so a safe copy (fresh
// cache) can be handed to another thread of control, and shared copies on
// one thread interleave freely.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;

use polku_weight::Semiring;

use crate::iter::{ArcIter, StateIter};
use crate::properties as props;
use crate::symbols::SymbolTable;
use crate::traits::{ExpandedFst, Fst};
use crate::transition::Transition;
use crate::{EPSILON, StateId};

/// Computes a delayed transducer's states on demand.
///
/// The state-id space must be decidable up front (`num_states`) without
/// expanding anything; only `expand` may touch per-state structure. The
/// expander must never mutate its source, and expanding the same state
/// twice must yield the same result.
pub trait StateExpander: Clone {
    type W: Semiring;

    fn start(&self) -> Option<StateId>;

    fn num_states(&self) -> usize;

    /// Materialize one state.
    fn expand(&self, state: StateId) -> ExpandedState<Self::W>;

    /// Known trinary properties of the delayed result, from the
    /// operation's transfer function.
    fn properties(&self) -> u64;

    fn fst_type(&self) -> &'static str;
}

/// A materialized state: its final weight and outgoing transitions.
#[derive(Debug, Clone)]
pub struct ExpandedState<W> {
    pub final_weight: W,
    pub transitions: Vec<Transition<W>>,
}

#[derive(Debug)]
struct LazyCache<W> {
    states: HashMap<StateId, ExpandedState<W>>,
    /// Result of a full structural scan, once one was forced.
    computed: Option<u64>,
}

#[derive(Debug)]
struct LazyShared<E: StateExpander> {
    expander: E,
    isyms: Option<SymbolTable>,
    osyms: Option<SymbolTable>,
    cache: Mutex<LazyCache<E::W>>,
}

/// Delayed transducer over a [`StateExpander`].
///
/// Implements the same capability traits as the eager representations, so
/// algorithms consuming [`Fst`] never learn whether their input is lazy.
#[derive(Debug)]
pub struct LazyFst<E: StateExpander> {
    shared: Arc<LazyShared<E>>,
}

impl<E: StateExpander> Clone for LazyFst<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E: StateExpander> LazyFst<E> {
    pub fn new(
        expander: E,
        isyms: Option<SymbolTable>,
        osyms: Option<SymbolTable>,
    ) -> Self {
        Self {
            shared: Arc::new(LazyShared {
                expander,
                isyms,
                osyms,
                cache: Mutex::new(LazyCache {
                    states: HashMap::new(),
                    computed: None,
                }),
            }),
        }
    }

    /// The wrapped expander.
    pub fn expander(&self) -> &E {
        &self.shared.expander
    }

    fn lock(&self) -> MutexGuard<'_, LazyCache<E::W>> {
        self.shared
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the cached expansion of `state`, expanding first when
    /// unvisited. The expander runs outside the lock.
    fn with_state<R>(&self, state: StateId, f: impl FnOnce(&ExpandedState<E::W>) -> R) -> R {
        {
            let cache = self.lock();
            if let Some(st) = cache.states.get(&state) {
                return f(st);
            }
        }
        let expanded = self.shared.expander.expand(state);
        let mut cache = self.lock();
        let entry = cache.states.entry(state).or_insert(expanded);
        f(entry)
    }
}

impl<E: StateExpander> Fst for LazyFst<E> {
    type W = E::W;

    fn start(&self) -> Option<StateId> {
        self.shared.expander.start()
    }

    fn final_weight(&self, state: StateId) -> E::W {
        self.with_state(state, |st| st.final_weight.clone())
    }

    fn num_arcs(&self, state: StateId) -> usize {
        self.with_state(state, |st| st.transitions.len())
    }

    fn num_input_epsilons(&self, state: StateId) -> usize {
        self.with_state(state, |st| {
            st.transitions
                .iter()
                .filter(|tr| tr.ilabel == EPSILON)
                .count()
        })
    }

    fn num_output_epsilons(&self, state: StateId) -> usize {
        self.with_state(state, |st| {
            st.transitions
                .iter()
                .filter(|tr| tr.olabel == EPSILON)
                .count()
        })
    }

    fn properties(&self, mask: u64, test: bool) -> u64 {
        let current = match self.lock().computed {
            Some(c) => c | props::EXPANDED,
            None => {
                (self.shared.expander.properties() & props::TRINARY_PROPERTIES)
                    | props::EXPANDED
            }
        };
        if test {
            let unknown = mask & props::TRINARY_PROPERTIES & !props::known_properties(current);
            if unknown != 0 {
                // the caller asked for facts only a scan can resolve;
                // this visits (and caches) every state
                let computed = props::compute_properties(self);
                self.lock().computed = Some(computed);
                return (computed | props::EXPANDED) & mask;
            }
        }
        current & mask
    }

    fn fst_type(&self) -> &'static str {
        self.shared.expander.fst_type()
    }

    fn input_symbols(&self) -> Option<&SymbolTable> {
        self.shared.isyms.as_ref()
    }

    fn output_symbols(&self) -> Option<&SymbolTable> {
        self.shared.osyms.as_ref()
    }

    fn states(&self) -> StateIter {
        StateIter::new(self.shared.expander.num_states())
    }

    fn arcs(&self, state: StateId) -> ArcIter<'_, E::W> {
        ArcIter::owned(self.with_state(state, |st| st.transitions.clone()))
    }

    fn copy(&self, safe: bool) -> Self {
        if safe {
            Self::new(
                self.shared.expander.clone(),
                self.shared.isyms.clone(),
                self.shared.osyms.clone(),
            )
        } else {
            self.clone()
        }
    }
}

impl<E: StateExpander> ExpandedFst for LazyFst<E> {
    fn num_states(&self) -> usize {
        self.shared.expander.num_states()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polku_weight::TropicalWeight;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Chain of `n` states, state i -> i+1 on label i+1, last state final;
    /// counts how often each expansion runs.
    #[derive(Clone)]
    struct ChainExpander {
        n: usize,
        expansions: Arc<AtomicUsize>,
    }

    impl ChainExpander {
        fn new(n: usize) -> Self {
            Self {
                n,
                expansions: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl StateExpander for ChainExpander {
        type W = TropicalWeight;

        fn start(&self) -> Option<StateId> {
            Some(0)
        }

        fn num_states(&self) -> usize {
            self.n
        }

        fn expand(&self, state: StateId) -> ExpandedState<TropicalWeight> {
            self.expansions.fetch_add(1, Ordering::SeqCst);
            let last = state as usize + 1 == self.n;
            ExpandedState {
                final_weight: if last {
                    TropicalWeight::one()
                } else {
                    TropicalWeight::zero()
                },
                transitions: if last {
                    Vec::new()
                } else {
                    vec![Transition::new(
                        state + 1,
                        state + 1,
                        TropicalWeight::new(1.0),
                        state + 1,
                    )]
                },
            }
        }

        fn properties(&self) -> u64 {
            props::ACYCLIC
        }

        fn fst_type(&self) -> &'static str {
            "chain"
        }
    }

    #[test]
    fn expands_only_visited_states() {
        let expander = ChainExpander::new(5);
        let counter = Arc::clone(&expander.expansions);
        let fst = LazyFst::new(expander, None, None);

        assert_eq!(fst.num_arcs(2), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        // state count queries expand nothing
        assert_eq!(fst.num_states(), 5);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cached_state_is_never_recomputed() {
        let expander = ChainExpander::new(3);
        let counter = Arc::clone(&expander.expansions);
        let fst = LazyFst::new(expander, None, None);

        let first = fst.arcs(1).as_slice().to_vec();
        let again = fst.arcs(1).as_slice().to_vec();
        assert_eq!(first, again);
        assert_eq!(fst.final_weight(1), TropicalWeight::zero());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shared_copy_shares_the_cache() {
        let expander = ChainExpander::new(3);
        let counter = Arc::clone(&expander.expansions);
        let fst = LazyFst::new(expander, None, None);
        let alias = fst.copy(false);

        fst.num_arcs(0);
        alias.num_arcs(0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn safe_copy_gets_a_fresh_cache() {
        let expander = ChainExpander::new(3);
        let counter = Arc::clone(&expander.expansions);
        let fst = LazyFst::new(expander, None, None);
        fst.num_arcs(0);

        let safe = fst.copy(true);
        safe.num_arcs(0);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(safe.arcs(0).as_slice(), fst.arcs(0).as_slice());
    }

    #[test]
    fn properties_come_from_the_expander_until_scanned() {
        let fst = LazyFst::new(ChainExpander::new(2), None, None);
        let p = fst.properties(props::ALL_PROPERTIES, false);
        assert_ne!(p & props::ACYCLIC, 0);
        assert_ne!(p & props::EXPANDED, 0);
        assert_eq!(p & props::MUTABLE, 0);
        // unknown pair forces the scan
        let p = fst.properties(props::ACCEPTOR | props::NOT_ACCEPTOR, true);
        assert_ne!(p & props::ACCEPTOR, 0);
    }
}
