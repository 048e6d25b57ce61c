// Acceptor complementation, delayed.
//
// The source must be an unweighted, epsilon-free, input-deterministic
// acceptor. The result completes it with rho-transitions and exchanges
// final and non-final states: output state 0 is a fresh sink that every
// rho-transition targets, and output state s corresponds to source state
// s - 1. The first transition of every output state is the rho, the rest
// mirror the source.

use polku_weight::Semiring;

use crate::lazy::{ExpandedState, LazyFst, StateExpander};
use crate::properties as props;
use crate::traits::{ExpandedFst, Fst};
use crate::transition::Transition;
use crate::{FstError, Label, StateId};

/// Label of the completion transition, matching any label not otherwise
/// leaving a state. Reserved; library-internal like the representation it
/// completes.
pub const RHO_LABEL: Label = Label::MAX;

/// Expander for the complemented acceptor.
#[derive(Debug, Clone)]
pub struct ComplementExpander<F: ExpandedFst + Clone> {
    fst: F,
}

impl<F: ExpandedFst + Clone> StateExpander for ComplementExpander<F> {
    type W = F::W;

    fn start(&self) -> Option<StateId> {
        match self.fst.start() {
            Some(s) => Some(s + 1),
            None => Some(0),
        }
    }

    fn num_states(&self) -> usize {
        self.fst.num_states() + 1
    }

    fn expand(&self, state: StateId) -> ExpandedState<F::W> {
        let rho = Transition::new(RHO_LABEL, RHO_LABEL, F::W::one(), 0);
        if state == 0 {
            // the sink accepts everything forever
            return ExpandedState {
                final_weight: F::W::one(),
                transitions: vec![rho],
            };
        }
        let source = state - 1;
        let final_weight = if self.fst.final_weight(source) == F::W::zero() {
            F::W::one()
        } else {
            F::W::zero()
        };
        let mut transitions = vec![rho];
        let mut aiter = self.fst.arcs(source);
        while !aiter.done() {
            let tr = aiter.value();
            transitions.push(Transition::new(
                tr.ilabel,
                tr.olabel,
                tr.weight.clone(),
                tr.nextstate + 1,
            ));
            aiter.next();
        }
        ExpandedState {
            final_weight,
            transitions,
        }
    }

    fn properties(&self) -> u64 {
        // completion keeps the acceptor deterministic and epsilon-free,
        // and the rho self-loop on the sink is a cycle
        props::ACCEPTOR
            | props::UNWEIGHTED
            | props::NO_EPSILONS
            | props::NO_I_EPSILONS
            | props::NO_O_EPSILONS
            | props::I_DETERMINISTIC
            | props::CYCLIC
    }

    fn fst_type(&self) -> &'static str {
        "complement"
    }
}

/// Delayed complement of an acceptor.
pub type ComplementFst<F> = LazyFst<ComplementExpander<F>>;

/// Wrap `fst` in a delayed complement view.
///
/// Fails unless the source is an unweighted epsilon-free deterministic
/// acceptor (verified with a structural scan when not already known).
pub fn complement_fst<F: ExpandedFst + Clone>(fst: F) -> Result<ComplementFst<F>, FstError> {
    let required =
        props::ACCEPTOR | props::UNWEIGHTED | props::NO_EPSILONS | props::I_DETERMINISTIC;
    if fst.properties(required, true) != required {
        tracing::error!(
            fst_type = fst.fst_type(),
            "complement requires an unweighted epsilon-free deterministic acceptor"
        );
        return Err(FstError::IncompatibleFst {
            operation: "complement",
            required: "an unweighted epsilon-free deterministic acceptor",
        });
    }
    let isyms = fst.input_symbols().cloned();
    let osyms = fst.output_symbols().cloned();
    Ok(LazyFst::new(ComplementExpander { fst }, isyms, osyms))
}
