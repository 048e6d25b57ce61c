// Inversion: exchange input and output labels.

use crate::lazy::{ExpandedState, LazyFst, StateExpander};
use crate::properties::{ALL_PROPERTIES, TRINARY_PROPERTIES, invert_properties};
use crate::traits::{ExpandedFst, Fst, MutableFst};
use crate::transition::Transition;
use crate::StateId;

/// Invert in place: every transition's labels swap, the symbol tables
/// trade places wholesale, and the property cache moves through the
/// inversion transfer instead of a rescan. Linear in states and
/// transitions.
pub fn invert<F: MutableFst + ?Sized>(fst: &mut F) {
    let props = fst.properties(ALL_PROPERTIES, false);
    let mut siter = fst.states();
    while !siter.done() {
        let s = siter.value();
        let mut aiter = fst.arcs_mut(s);
        while !aiter.done() {
            let tr = aiter.value().clone();
            aiter.set_value(Transition::new(tr.olabel, tr.ilabel, tr.weight, tr.nextstate));
            aiter.next();
        }
        siter.next();
    }
    let isyms = fst.input_symbols().cloned();
    let osyms = fst.output_symbols().cloned();
    fst.set_input_symbols(osyms);
    fst.set_output_symbols(isyms);
    fst.set_properties(invert_properties(props), ALL_PROPERTIES);
}

/// Expander mapping each visited transition through the label swap.
#[derive(Debug, Clone)]
pub struct InvertExpander<F: ExpandedFst + Clone> {
    fst: F,
}

impl<F: ExpandedFst + Clone> StateExpander for InvertExpander<F> {
    type W = F::W;

    fn start(&self) -> Option<StateId> {
        self.fst.start()
    }

    fn num_states(&self) -> usize {
        self.fst.num_states()
    }

    fn expand(&self, state: StateId) -> ExpandedState<F::W> {
        let mut transitions = Vec::with_capacity(self.fst.num_arcs(state));
        let mut aiter = self.fst.arcs(state);
        while !aiter.done() {
            let tr = aiter.value();
            transitions.push(Transition::new(
                tr.olabel,
                tr.ilabel,
                tr.weight.clone(),
                tr.nextstate,
            ));
            aiter.next();
        }
        ExpandedState {
            final_weight: self.fst.final_weight(state),
            transitions,
        }
    }

    fn properties(&self) -> u64 {
        invert_properties(self.fst.properties(TRINARY_PROPERTIES, false))
    }

    fn fst_type(&self) -> &'static str {
        "invert"
    }
}

/// Delayed inversion of `fst`.
pub type InvertFst<F> = LazyFst<InvertExpander<F>>;

/// Wrap `fst` in a delayed view with input and output exchanged: labels
/// swap per visited transition and the result's input symbols are the
/// source's output symbols and vice versa. The source is never mutated.
pub fn invert_fst<F: ExpandedFst + Clone>(fst: F) -> InvertFst<F> {
    let isyms = fst.output_symbols().cloned();
    let osyms = fst.input_symbols().cloned();
    LazyFst::new(InvertExpander { fst }, isyms, osyms)
}
