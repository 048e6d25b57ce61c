// Transition: the labeled, weighted edge between two states.

use polku_weight::{Semiring, TropicalWeight};

use crate::{Label, StateId};

/// A single outgoing transition of a state.
///
/// Transitions are owned by the state that holds them; the same transition
/// value is never shared between states. Label `0` ([`crate::EPSILON`])
/// marks the silent transition on the corresponding side.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<W> {
    pub ilabel: Label,
    pub olabel: Label,
    pub weight: W,
    pub nextstate: StateId,
}

impl<W: Semiring> Transition<W> {
    pub fn new(ilabel: Label, olabel: Label, weight: W, nextstate: StateId) -> Self {
        Self {
            ilabel,
            olabel,
            weight,
            nextstate,
        }
    }

    /// Epsilon transition carrying `one`, the weight-neutral silent move.
    pub fn epsilon(nextstate: StateId) -> Self {
        Self::new(crate::EPSILON, crate::EPSILON, W::one(), nextstate)
    }

    /// Whether both sides are epsilon.
    pub fn is_epsilon(&self) -> bool {
        self.ilabel == crate::EPSILON && self.olabel == crate::EPSILON
    }
}

/// Transition over the tropical semiring, the common default.
pub type StdTransition = Transition<TropicalWeight>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EPSILON;

    #[test]
    fn construction() {
        let t = StdTransition::new(2, 5, TropicalWeight::new(1.5), 7);
        assert_eq!(t.ilabel, 2);
        assert_eq!(t.olabel, 5);
        assert_eq!(t.weight, TropicalWeight::new(1.5));
        assert_eq!(t.nextstate, 7);
        assert!(!t.is_epsilon());
    }

    #[test]
    fn epsilon_transition() {
        let t = StdTransition::epsilon(3);
        assert_eq!(t.ilabel, EPSILON);
        assert_eq!(t.olabel, EPSILON);
        assert_eq!(t.weight, TropicalWeight::one());
        assert!(t.is_epsilon());
    }

    #[test]
    fn one_sided_epsilon_is_not_epsilon() {
        let t = StdTransition::new(EPSILON, 4, TropicalWeight::one(), 0);
        assert!(!t.is_epsilon());
    }
}
