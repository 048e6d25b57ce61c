// Structural validation diagnostic.
//
// Mutators never validate referential integrity, that would defeat their
// linear-time contract. This pass is the explicit check callers run when
// they suspect an unsafe mutation sequence left the graph inconsistent.

use polku_weight::Semiring;

use crate::traits::ExpandedFst;
use crate::{FstError, StateId};

/// Check start validity, transition targets and weight membership,
/// reporting the first violation found.
pub fn verify<F: ExpandedFst + ?Sized>(fst: &F) -> Result<(), FstError> {
    let num_states = fst.num_states() as StateId;
    if let Some(start) = fst.start() {
        if start >= num_states {
            return Err(FstError::BadStartState { state: start });
        }
    }
    let mut siter = fst.states();
    while !siter.done() {
        let s = siter.value();
        if !fst.final_weight(s).is_member() {
            return Err(FstError::BadWeight { state: s });
        }
        let mut aiter = fst.arcs(s);
        while !aiter.done() {
            let tr = aiter.value();
            if tr.nextstate >= num_states {
                return Err(FstError::DanglingTransition {
                    state: s,
                    nextstate: tr.nextstate,
                });
            }
            if !tr.weight.is_member() {
                return Err(FstError::BadWeight { state: s });
            }
            aiter.next();
        }
        siter.next();
    }
    Ok(())
}
