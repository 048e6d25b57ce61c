// Concatenative closure.
//
// If the transducer maps string x to y with weight a, its closure also
// maps xx to yy with times(a, a), xxx to yyy with times(times(a, a), a),
// and so on. Star closure additionally accepts the empty string with
// weight one.

use polku_weight::Semiring;

use crate::lazy::{ExpandedState, LazyFst, StateExpander};
use crate::properties::{ALL_PROPERTIES, TRINARY_PROPERTIES, closure_properties};
use crate::traits::{ExpandedFst, Fst, MutableFst};
use crate::transition::Transition;
use crate::{EPSILON, StateId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureType {
    /// Accepts one or more repetitions.
    Plus,
    /// Accepts zero or more repetitions; the empty string gets weight one.
    Star,
}

/// Close in place: every final state gets an epsilon transition back to
/// the start carrying its final weight; star closure appends a fresh
/// start, final with one, with an epsilon transition to the old start.
/// The property cache moves through the closure transfer, no rescan.
/// Linear time and space in the state count.
pub fn closure<F: MutableFst + ?Sized>(fst: &mut F, closure_type: ClosureType) {
    let props = fst.properties(ALL_PROPERTIES, false);
    let start = fst.start();
    if let Some(start) = start {
        let mut siter = fst.states();
        while !siter.done() {
            let s = siter.value();
            let weight = fst.final_weight(s);
            if weight != F::W::zero() {
                fst.add_arc(s, Transition::new(EPSILON, EPSILON, weight, start));
            }
            siter.next();
        }
    }
    if closure_type == ClosureType::Star {
        fst.reserve_states(fst.num_states() + 1);
        let nstart = fst.add_state();
        fst.set_start(Some(nstart));
        fst.set_final(nstart, F::W::one());
        if let Some(old) = start {
            fst.add_arc(nstart, Transition::epsilon(old));
        }
    }
    fst.set_properties(
        closure_properties(props, closure_type == ClosureType::Star),
        ALL_PROPERTIES,
    );
}

/// Expander producing the closure of its source with the same state
/// numbering the destructive version would assign.
#[derive(Debug, Clone)]
pub struct ClosureExpander<F: ExpandedFst + Clone> {
    fst: F,
    closure_type: ClosureType,
}

impl<F: ExpandedFst + Clone> ClosureExpander<F> {
    /// Id of the appended star start state.
    fn star_start(&self) -> StateId {
        self.fst.num_states() as StateId
    }
}

impl<F: ExpandedFst + Clone> StateExpander for ClosureExpander<F> {
    type W = F::W;

    fn start(&self) -> Option<StateId> {
        match self.closure_type {
            ClosureType::Star => Some(self.star_start()),
            ClosureType::Plus => self.fst.start(),
        }
    }

    fn num_states(&self) -> usize {
        self.fst.num_states()
            + match self.closure_type {
                ClosureType::Star => 1,
                ClosureType::Plus => 0,
            }
    }

    fn expand(&self, state: StateId) -> ExpandedState<F::W> {
        if self.closure_type == ClosureType::Star && state == self.star_start() {
            return ExpandedState {
                final_weight: F::W::one(),
                transitions: match self.fst.start() {
                    Some(old) => vec![Transition::epsilon(old)],
                    None => Vec::new(),
                },
            };
        }
        let mut transitions: Vec<_> = self.fst.arcs(state).as_slice().to_vec();
        let final_weight = self.fst.final_weight(state);
        if let Some(start) = self.fst.start() {
            if final_weight != F::W::zero() {
                transitions.push(Transition::new(
                    EPSILON,
                    EPSILON,
                    final_weight.clone(),
                    start,
                ));
            }
        }
        ExpandedState {
            final_weight,
            transitions,
        }
    }

    fn properties(&self) -> u64 {
        closure_properties(
            self.fst.properties(TRINARY_PROPERTIES, false),
            self.closure_type == ClosureType::Star,
        )
    }

    fn fst_type(&self) -> &'static str {
        "closure"
    }
}

/// Delayed closure of `fst`.
pub type ClosureFst<F> = LazyFst<ClosureExpander<F>>;

/// Wrap `fst` in a delayed closure view; per visited state the result is
/// identical to what the destructive [`closure`] would produce, and the
/// source is never mutated.
pub fn closure_fst<F: ExpandedFst + Clone>(fst: F, closure_type: ClosureType) -> ClosureFst<F> {
    let isyms = fst.input_symbols().cloned();
    let osyms = fst.output_symbols().cloned();
    LazyFst::new(
        ClosureExpander { fst, closure_type },
        isyms,
        osyms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::VectorFst;
    use polku_weight::{Semiring, TropicalWeight};

    type F = VectorFst<TropicalWeight>;

    fn w(v: f32) -> TropicalWeight {
        TropicalWeight::new(v)
    }

    /// Accepts 1 -> 2 with weight 2.0 (arc) times 3.0 (final).
    fn sample() -> F {
        let mut fst = F::new();
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        fst.set_start(Some(s0));
        fst.add_arc(s0, Transition::new(1, 2, w(2.0), s1));
        fst.set_final(s1, w(3.0));
        fst
    }

    /// Total weight of accepting `labels` from the start, tropical.
    fn accept(fst: &impl Fst<W = TropicalWeight>, labels: &[u32]) -> TropicalWeight {
        fn go(
            fst: &impl Fst<W = TropicalWeight>,
            state: u32,
            labels: &[u32],
            acc: TropicalWeight,
            best: &mut TropicalWeight,
        ) {
            if labels.is_empty() {
                *best = best.plus(&acc.times(&fst.final_weight(state)));
            }
            let mut aiter = fst.arcs(state);
            while !aiter.done() {
                let tr = aiter.value().clone();
                if tr.is_epsilon() {
                    go(fst, tr.nextstate, labels, acc.times(&tr.weight), best);
                } else if labels.first() == Some(&tr.ilabel) {
                    go(fst, tr.nextstate, &labels[1..], acc.times(&tr.weight), best);
                }
                aiter.next();
            }
        }
        let mut best = TropicalWeight::zero();
        if let Some(start) = fst.start() {
            go(fst, start, labels, TropicalWeight::one(), &mut best);
        }
        best
    }

    #[test]
    fn plus_closure_accepts_repetitions() {
        let mut fst = sample();
        closure(&mut fst, ClosureType::Plus);
        assert_eq!(accept(&fst, &[1]), w(5.0));
        assert_eq!(accept(&fst, &[1, 1]), w(10.0));
        // no new state, one new transition from the final state
        assert_eq!(fst.num_states(), 2);
        assert_eq!(fst.num_arcs(1), 1);
        assert_eq!(
            fst.arcs(1).value(),
            &Transition::new(EPSILON, EPSILON, w(3.0), 0)
        );
    }

    #[test]
    fn plus_closure_rejects_empty_string() {
        let mut fst = sample();
        closure(&mut fst, ClosureType::Plus);
        assert_eq!(accept(&fst, &[]), TropicalWeight::zero());
    }

    #[test]
    fn star_closure_accepts_empty_string_with_one() {
        let mut fst = sample();
        closure(&mut fst, ClosureType::Star);
        assert_eq!(fst.num_states(), 3);
        assert_eq!(fst.start(), Some(2));
        assert_eq!(fst.final_weight(2), TropicalWeight::one());
        assert_eq!(accept(&fst, &[]), TropicalWeight::one());
        assert_eq!(accept(&fst, &[1]), w(5.0));
        assert_eq!(accept(&fst, &[1, 1]), w(10.0));
    }

    #[test]
    fn closure_on_startless_fst_adds_no_dangling_arcs() {
        let mut fst = F::new();
        let s0 = fst.add_state();
        fst.set_final(s0, w(1.0));
        closure(&mut fst, ClosureType::Plus);
        assert_eq!(fst.num_arcs(s0), 0);
    }

    #[test]
    fn star_closure_of_empty_fst() {
        let mut fst = F::new();
        closure(&mut fst, ClosureType::Star);
        assert_eq!(fst.num_states(), 1);
        assert_eq!(fst.start(), Some(0));
        assert_eq!(accept(&fst, &[]), TropicalWeight::one());
    }

    #[test]
    fn delayed_closure_matches_destructive() {
        for closure_type in [ClosureType::Plus, ClosureType::Star] {
            let src = sample();
            let mut eager = src.copy(true);
            closure(&mut eager, closure_type);
            let delayed = closure_fst(src.clone(), closure_type);

            assert_eq!(delayed.num_states(), eager.num_states());
            assert_eq!(delayed.start(), eager.start());
            let mut siter = delayed.states();
            while !siter.done() {
                let s = siter.value();
                assert_eq!(delayed.final_weight(s), eager.final_weight(s));
                assert_eq!(delayed.arcs(s).as_slice(), eager.arcs(s).as_slice());
                siter.next();
            }
            // the source is untouched
            assert_eq!(src.num_states(), 2);
            assert_eq!(src.num_arcs(1), 0);
        }
    }

    #[test]
    fn delayed_closure_accepts_like_eager() {
        let delayed = closure_fst(sample(), ClosureType::Star);
        assert_eq!(accept(&delayed, &[]), TropicalWeight::one());
        assert_eq!(accept(&delayed, &[1, 1, 1]), w(15.0));
    }
}
