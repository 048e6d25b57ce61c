// Structural property bitmask: singleton bits, trinary pairs, transfer
// functions for every mutator and operation, and the full structural scan.
//
// A trinary property occupies two bits, one asserting the fact and one
// denying it; both clear means unknown. A bit is trustworthy only when its
// pair is known, so mutators must re-mask the cache through their transfer
// function rather than leave stale assertions behind.

use hashbrown::HashSet;
use polku_weight::Semiring;

use crate::iter::StateIter;
use crate::traits::Fst;
use crate::transition::Transition;
use crate::{EPSILON, StateId};

// Singleton properties, always known.
pub const EXPANDED: u64 = 1 << 0;
pub const MUTABLE: u64 = 1 << 1;
pub const ERROR: u64 = 1 << 2;

// Trinary pairs: assertion bit, denial bit.
pub const ACCEPTOR: u64 = 1 << 3;
pub const NOT_ACCEPTOR: u64 = 1 << 4;
pub const I_DETERMINISTIC: u64 = 1 << 5;
pub const NON_I_DETERMINISTIC: u64 = 1 << 6;
pub const O_DETERMINISTIC: u64 = 1 << 7;
pub const NON_O_DETERMINISTIC: u64 = 1 << 8;
pub const NO_EPSILONS: u64 = 1 << 9;
pub const EPSILONS: u64 = 1 << 10;
pub const NO_I_EPSILONS: u64 = 1 << 11;
pub const I_EPSILONS: u64 = 1 << 12;
pub const NO_O_EPSILONS: u64 = 1 << 13;
pub const O_EPSILONS: u64 = 1 << 14;
pub const ACYCLIC: u64 = 1 << 15;
pub const CYCLIC: u64 = 1 << 16;
pub const INITIAL_ACYCLIC: u64 = 1 << 17;
pub const INITIAL_CYCLIC: u64 = 1 << 18;
pub const UNWEIGHTED: u64 = 1 << 19;
pub const WEIGHTED: u64 = 1 << 20;

const PAIRS: [(u64, u64); 9] = [
    (ACCEPTOR, NOT_ACCEPTOR),
    (I_DETERMINISTIC, NON_I_DETERMINISTIC),
    (O_DETERMINISTIC, NON_O_DETERMINISTIC),
    (NO_EPSILONS, EPSILONS),
    (NO_I_EPSILONS, I_EPSILONS),
    (NO_O_EPSILONS, O_EPSILONS),
    (ACYCLIC, CYCLIC),
    (INITIAL_ACYCLIC, INITIAL_CYCLIC),
    (UNWEIGHTED, WEIGHTED),
];

pub const BINARY_PROPERTIES: u64 = EXPANDED | MUTABLE | ERROR;
pub const POS_TRINARY_PROPERTIES: u64 = ACCEPTOR
    | I_DETERMINISTIC
    | O_DETERMINISTIC
    | NO_EPSILONS
    | NO_I_EPSILONS
    | NO_O_EPSILONS
    | ACYCLIC
    | INITIAL_ACYCLIC
    | UNWEIGHTED;
pub const NEG_TRINARY_PROPERTIES: u64 = NOT_ACCEPTOR
    | NON_I_DETERMINISTIC
    | NON_O_DETERMINISTIC
    | EPSILONS
    | I_EPSILONS
    | O_EPSILONS
    | CYCLIC
    | INITIAL_CYCLIC
    | WEIGHTED;
pub const TRINARY_PROPERTIES: u64 = POS_TRINARY_PROPERTIES | NEG_TRINARY_PROPERTIES;
pub const ALL_PROPERTIES: u64 = BINARY_PROPERTIES | TRINARY_PROPERTIES;

/// Properties that depend on mutation history rather than current
/// structure; changing these on a shared representation requires a fork.
pub const EXTRINSIC_PROPERTIES: u64 = ERROR;
pub const INTRINSIC_PROPERTIES: u64 = ALL_PROPERTIES & !EXTRINSIC_PROPERTIES;

/// Mask of bits whose truth value is known in `props`.
pub fn known_properties(props: u64) -> u64 {
    let mut known = BINARY_PROPERTIES;
    for (yes, no) in PAIRS {
        if props & (yes | no) != 0 {
            known |= yes | no;
        }
    }
    known
}

/// Everything a freshly created empty transducer is known to satisfy.
pub fn empty_properties() -> u64 {
    POS_TRINARY_PROPERTIES
}

fn assert_false(props: u64, yes: u64, no: u64) -> u64 {
    (props & !yes) | no
}

fn forget(props: u64, yes: u64, no: u64) -> u64 {
    props & !(yes | no)
}

/// Transfer for `set_start`: the initial-cycle facts are tied to the old
/// start state.
pub fn set_start_properties(props: u64) -> u64 {
    forget(props, INITIAL_ACYCLIC, INITIAL_CYCLIC)
}

/// Transfer for `set_final`: only the weighted/unweighted facts can move.
pub fn set_final_properties(props: u64) -> u64 {
    forget(props, UNWEIGHTED, WEIGHTED)
}

/// Transfer for `add_state`: an isolated state changes nothing structural.
pub fn add_state_properties(props: u64) -> u64 {
    props
}

/// Transfer for `add_arc`. Assertions the new transition definitely breaks
/// flip to denials; assertions it may break become unknown; denials stay.
pub fn add_arc_properties<W: Semiring>(
    props: u64,
    state: StateId,
    tr: &Transition<W>,
    start: Option<StateId>,
) -> u64 {
    let mut out = props;
    if tr.ilabel != tr.olabel {
        out = assert_false(out, ACCEPTOR, NOT_ACCEPTOR);
    }
    if tr.ilabel == EPSILON {
        out = assert_false(out, NO_I_EPSILONS, I_EPSILONS);
    }
    if tr.olabel == EPSILON {
        out = assert_false(out, NO_O_EPSILONS, O_EPSILONS);
    }
    if tr.is_epsilon() {
        out = assert_false(out, NO_EPSILONS, EPSILONS);
    }
    if tr.weight != W::one() {
        out = assert_false(out, UNWEIGHTED, WEIGHTED);
    }
    // a second transition out of `state` may duplicate a label
    out &= !(I_DETERMINISTIC | O_DETERMINISTIC);
    if tr.nextstate == state {
        out = assert_false(out, ACYCLIC, CYCLIC);
        if start == Some(state) {
            out = assert_false(out, INITIAL_ACYCLIC, INITIAL_CYCLIC);
        }
    } else {
        out &= !ACYCLIC;
        out &= !INITIAL_ACYCLIC;
    }
    out
}

/// Transfer for deletions: removing states or transitions preserves every
/// assertion (a subgraph cannot gain structure) but invalidates denials.
pub fn delete_properties(props: u64) -> u64 {
    props & (BINARY_PROPERTIES | POS_TRINARY_PROPERTIES)
}

/// Transfer for the concatenative closure.
pub fn closure_properties(props: u64, star: bool) -> u64 {
    let mut out = props & (ERROR | ACCEPTOR | NOT_ACCEPTOR | WEIGHTED);
    // epsilon transitions back to the start are added for every final state
    out = assert_false(out, NO_EPSILONS, EPSILONS);
    out = assert_false(out, NO_I_EPSILONS, I_EPSILONS);
    out = assert_false(out, NO_O_EPSILONS, O_EPSILONS);
    if star {
        // the fresh start has one outgoing epsilon and no incoming arcs
        out |= INITIAL_ACYCLIC;
    }
    out
}

/// Transfer for inversion: input-side and output-side facts trade places.
pub fn invert_properties(props: u64) -> u64 {
    let keep = !(I_DETERMINISTIC
        | NON_I_DETERMINISTIC
        | O_DETERMINISTIC
        | NON_O_DETERMINISTIC
        | NO_I_EPSILONS
        | I_EPSILONS
        | NO_O_EPSILONS
        | O_EPSILONS);
    let mut out = props & keep;
    if props & I_DETERMINISTIC != 0 {
        out |= O_DETERMINISTIC;
    }
    if props & NON_I_DETERMINISTIC != 0 {
        out |= NON_O_DETERMINISTIC;
    }
    if props & O_DETERMINISTIC != 0 {
        out |= I_DETERMINISTIC;
    }
    if props & NON_O_DETERMINISTIC != 0 {
        out |= NON_I_DETERMINISTIC;
    }
    if props & NO_I_EPSILONS != 0 {
        out |= NO_O_EPSILONS;
    }
    if props & I_EPSILONS != 0 {
        out |= O_EPSILONS;
    }
    if props & NO_O_EPSILONS != 0 {
        out |= NO_I_EPSILONS;
    }
    if props & O_EPSILONS != 0 {
        out |= I_EPSILONS;
    }
    out
}

/// Full structural scan resolving every trinary pair. Linear in states and
/// transitions; callers cache the result through their property store.
pub fn compute_properties<F: Fst + ?Sized>(fst: &F) -> u64 {
    let num_states = {
        let siter = fst.states();
        siter.num_states()
    };

    let mut acceptor = true;
    let mut i_deterministic = true;
    let mut o_deterministic = true;
    let mut no_epsilons = true;
    let mut no_i_epsilons = true;
    let mut no_o_epsilons = true;
    let mut unweighted = true;

    let one = F::W::one();
    let zero = F::W::zero();

    let mut siter = StateIter::new(num_states);
    while !siter.done() {
        let s = siter.value();
        let mut ilabels: HashSet<u32> = HashSet::new();
        let mut olabels: HashSet<u32> = HashSet::new();
        let mut aiter = fst.arcs(s);
        while !aiter.done() {
            let tr = aiter.value();
            if tr.ilabel != tr.olabel {
                acceptor = false;
            }
            if tr.ilabel == EPSILON {
                no_i_epsilons = false;
            }
            if tr.olabel == EPSILON {
                no_o_epsilons = false;
            }
            if tr.is_epsilon() {
                no_epsilons = false;
            }
            if tr.weight != one {
                unweighted = false;
            }
            if !ilabels.insert(tr.ilabel) {
                i_deterministic = false;
            }
            if !olabels.insert(tr.olabel) {
                o_deterministic = false;
            }
            aiter.next();
        }
        let fw = fst.final_weight(s);
        if fw != zero && fw != one {
            unweighted = false;
        }
        siter.next();
    }

    let acyclic = is_acyclic(fst, num_states);
    let initial_cyclic = match fst.start() {
        Some(start) if !acyclic => start_on_cycle(fst, num_states, start),
        _ => false,
    };

    let mut props = 0;
    props |= if acceptor { ACCEPTOR } else { NOT_ACCEPTOR };
    props |= if i_deterministic {
        I_DETERMINISTIC
    } else {
        NON_I_DETERMINISTIC
    };
    props |= if o_deterministic {
        O_DETERMINISTIC
    } else {
        NON_O_DETERMINISTIC
    };
    props |= if no_epsilons { NO_EPSILONS } else { EPSILONS };
    props |= if no_i_epsilons {
        NO_I_EPSILONS
    } else {
        I_EPSILONS
    };
    props |= if no_o_epsilons {
        NO_O_EPSILONS
    } else {
        O_EPSILONS
    };
    props |= if acyclic { ACYCLIC } else { CYCLIC };
    props |= if initial_cyclic {
        INITIAL_CYCLIC
    } else {
        INITIAL_ACYCLIC
    };
    props |= if unweighted { UNWEIGHTED } else { WEIGHTED };
    props
}

const WHITE: u8 = 0;
const GRAY: u8 = 1;
const BLACK: u8 = 2;

fn is_acyclic<F: Fst + ?Sized>(fst: &F, num_states: usize) -> bool {
    let mut color = vec![WHITE; num_states];
    for root in 0..num_states as StateId {
        if color[root as usize] != WHITE {
            continue;
        }
        color[root as usize] = GRAY;
        let mut stack = vec![(root, fst.arcs(root))];
        loop {
            let step = match stack.last_mut() {
                None => break,
                Some((s, aiter)) => {
                    if aiter.done() {
                        color[*s as usize] = BLACK;
                        None
                    } else {
                        let next = aiter.value().nextstate;
                        aiter.next();
                        Some(next)
                    }
                }
            };
            match step {
                None => {
                    stack.pop();
                }
                Some(next) => match color[next as usize] {
                    WHITE => {
                        color[next as usize] = GRAY;
                        stack.push((next, fst.arcs(next)));
                    }
                    GRAY => return false,
                    _ => {}
                },
            }
        }
    }
    true
}

/// The start state lies on a cycle iff it is reachable from one of its own
/// successors.
fn start_on_cycle<F: Fst + ?Sized>(fst: &F, num_states: usize, start: StateId) -> bool {
    let mut visited = vec![false; num_states];
    let mut frontier = Vec::new();
    let mut aiter = fst.arcs(start);
    while !aiter.done() {
        let next = aiter.value().nextstate;
        if !visited[next as usize] {
            visited[next as usize] = true;
            frontier.push(next);
        }
        aiter.next();
    }
    while let Some(s) = frontier.pop() {
        if s == start {
            return true;
        }
        let mut aiter = fst.arcs(s);
        while !aiter.done() {
            let next = aiter.value().nextstate;
            if !visited[next as usize] {
                visited[next as usize] = true;
                frontier.push(next);
            }
            aiter.next();
        }
    }
    false
}
