// Copy-on-write mutable vector representation.
//
// A `VectorFst` is a handle to a shared representation cell. Plain copies
// (`Clone`, `copy(false)`) share the cell; every mutator first runs the
// mutate-check, forking a private cell when the current one is shared, so
// no other handle ever observes the mutation. `copy(true)` forks eagerly
// and the result can move to another thread of control on its own.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use polku_weight::Semiring;

use crate::io::write_fst;
use crate::iter::{ArcIter, MutArcIter, StateIter};
use crate::properties as props;
use crate::symbols::SymbolTable;
use crate::traits::{ExpandedFst, Fst, MutableFst};
use crate::transition::Transition;
use crate::{EPSILON, FstError, StateId};

/// Registry tag of this representation.
pub const VECTOR_FST_TYPE: &str = "vector";

#[derive(Debug, Clone)]
struct VectorState<W> {
    final_weight: W,
    transitions: Vec<Transition<W>>,
}

impl<W: Semiring> VectorState<W> {
    fn new() -> Self {
        Self {
            final_weight: W::zero(),
            transitions: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct VectorRepr<W: Semiring> {
    states: Vec<VectorState<W>>,
    start: Option<StateId>,
    isyms: Option<SymbolTable>,
    osyms: Option<SymbolTable>,
    /// Property cache. Interior writes publish cached structural facts to
    /// every handle sharing this cell; structural mutators go through the
    /// fork first and then re-mask, so no alias ever sees a stale
    /// assertion.
    properties: AtomicU64,
}

impl<W: Semiring> VectorRepr<W> {
    fn empty(isyms: Option<SymbolTable>, osyms: Option<SymbolTable>) -> Self {
        Self {
            states: Vec::new(),
            start: None,
            isyms,
            osyms,
            properties: AtomicU64::new(
                props::empty_properties() | props::EXPANDED | props::MUTABLE,
            ),
        }
    }

    fn props(&self) -> u64 {
        self.properties.load(Ordering::Relaxed)
    }

    fn set_props(&self, value: u64) {
        self.properties.store(value, Ordering::Relaxed);
    }
}

impl<W: Semiring> Clone for VectorRepr<W> {
    fn clone(&self) -> Self {
        Self {
            states: self.states.clone(),
            start: self.start,
            isyms: self.isyms.clone(),
            osyms: self.osyms.clone(),
            properties: AtomicU64::new(self.props()),
        }
    }
}

/// Mutable transducer over vector storage with copy-on-write sharing.
///
/// `Clone` is the cheap sharing copy; see [`Fst::copy`] for the safe
/// variant.
#[derive(Debug, Clone)]
pub struct VectorFst<W: Semiring> {
    repr: Arc<VectorRepr<W>>,
}

impl<W: Semiring> VectorFst<W> {
    pub fn new() -> Self {
        Self {
            repr: Arc::new(VectorRepr::empty(None, None)),
        }
    }

    /// Rebuild any readable transducer into a fresh vector representation.
    /// This is the explicit conversion for callers holding a non-mutable
    /// source; linear in states and transitions.
    pub fn from_fst<F: Fst<W = W> + ?Sized>(src: &F) -> Self {
        let mut repr = VectorRepr::empty(
            src.input_symbols().cloned(),
            src.output_symbols().cloned(),
        );
        let mut siter = src.states();
        while !siter.done() {
            let s = siter.value();
            let mut state = VectorState::new();
            state.final_weight = src.final_weight(s);
            let mut aiter = src.arcs(s);
            while !aiter.done() {
                state.transitions.push(aiter.value().clone());
                aiter.next();
            }
            repr.states.push(state);
            siter.next();
        }
        repr.start = src.start();
        let trinary = src.properties(props::TRINARY_PROPERTIES, false);
        repr.set_props(trinary | props::EXPANDED | props::MUTABLE);
        Self {
            repr: Arc::new(repr),
        }
    }

    /// The mutate-check: fork the representation cell unless this handle
    /// is its only owner, then hand out mutable access.
    fn mutate(&mut self) -> &mut VectorRepr<W> {
        Arc::make_mut(&mut self.repr)
    }
}

impl<W: Semiring> Default for VectorFst<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Semiring> Fst for VectorFst<W> {
    type W = W;

    fn start(&self) -> Option<StateId> {
        self.repr.start
    }

    fn final_weight(&self, state: StateId) -> W {
        self.repr.states[state as usize].final_weight.clone()
    }

    fn num_arcs(&self, state: StateId) -> usize {
        self.repr.states[state as usize].transitions.len()
    }

    fn num_input_epsilons(&self, state: StateId) -> usize {
        self.repr.states[state as usize]
            .transitions
            .iter()
            .filter(|tr| tr.ilabel == EPSILON)
            .count()
    }

    fn num_output_epsilons(&self, state: StateId) -> usize {
        self.repr.states[state as usize]
            .transitions
            .iter()
            .filter(|tr| tr.olabel == EPSILON)
            .count()
    }

    fn properties(&self, mask: u64, test: bool) -> u64 {
        let cached = self.repr.props();
        if test {
            let unknown = mask & props::TRINARY_PROPERTIES & !props::known_properties(cached);
            if unknown != 0 {
                let computed = props::compute_properties(self);
                let updated = (cached & props::BINARY_PROPERTIES) | computed;
                self.repr.set_props(updated);
                return updated & mask;
            }
        }
        cached & mask
    }

    fn fst_type(&self) -> &'static str {
        VECTOR_FST_TYPE
    }

    fn input_symbols(&self) -> Option<&SymbolTable> {
        self.repr.isyms.as_ref()
    }

    fn output_symbols(&self) -> Option<&SymbolTable> {
        self.repr.osyms.as_ref()
    }

    fn states(&self) -> StateIter {
        StateIter::new(self.repr.states.len())
    }

    fn arcs(&self, state: StateId) -> ArcIter<'_, W> {
        ArcIter::borrowed(&self.repr.states[state as usize].transitions)
    }

    fn write(&self, w: &mut dyn io::Write) -> Result<(), FstError> {
        write_fst(self, w)
    }

    fn copy(&self, safe: bool) -> Self {
        if safe {
            Self {
                repr: Arc::new((*self.repr).clone()),
            }
        } else {
            self.clone()
        }
    }
}

impl<W: Semiring> ExpandedFst for VectorFst<W> {
    fn num_states(&self) -> usize {
        self.repr.states.len()
    }
}

impl<W: Semiring> MutableFst for VectorFst<W> {
    fn set_start(&mut self, state: Option<StateId>) {
        let repr = self.mutate();
        repr.start = state;
        let p = props::set_start_properties(repr.props());
        repr.set_props(p);
    }

    fn set_final(&mut self, state: StateId, weight: W) {
        let member = weight.is_member();
        let repr = self.mutate();
        repr.states[state as usize].final_weight = weight;
        let mut p = props::set_final_properties(repr.props());
        if !member {
            tracing::error!(state, "non-member final weight assigned");
            p |= props::ERROR;
        }
        repr.set_props(p);
    }

    fn set_properties(&mut self, value: u64, mask: u64) {
        // representation capability bits are fixed
        let mask = mask & !(props::EXPANDED | props::MUTABLE);
        let extrinsic = props::EXTRINSIC_PROPERTIES & mask;
        let current = self.repr.props();
        if (current & extrinsic) != (value & extrinsic) {
            let repr = self.mutate();
            let cur = repr.props();
            repr.set_props((cur & !mask) | (value & mask));
        } else {
            // intrinsic-only update: these bits cache facts about the
            // structure every alias shares, so the fork is skipped
            self.repr.set_props((current & !mask) | (value & mask));
        }
    }

    fn add_state(&mut self) -> StateId {
        let repr = self.mutate();
        repr.states.push(VectorState::new());
        let p = props::add_state_properties(repr.props());
        repr.set_props(p);
        (repr.states.len() - 1) as StateId
    }

    fn add_states(&mut self, n: usize) {
        let repr = self.mutate();
        repr.states
            .extend(std::iter::repeat_with(VectorState::new).take(n));
    }

    fn add_arc(&mut self, state: StateId, tr: Transition<W>) {
        let repr = self.mutate();
        let p = props::add_arc_properties(repr.props(), state, &tr, repr.start);
        repr.states[state as usize].transitions.push(tr);
        repr.set_props(p);
    }

    fn delete_states(&mut self, states: &[StateId]) {
        if states.is_empty() {
            return;
        }
        let repr = self.mutate();
        let p = props::delete_properties(repr.props());
        let n = repr.states.len();
        let mut dead = vec![false; n];
        for &s in states {
            dead[s as usize] = true;
        }
        let mut remap = vec![StateId::MAX; n];
        let mut next: StateId = 0;
        for old in 0..n {
            if !dead[old] {
                remap[old] = next;
                next += 1;
            }
        }
        let old_states = std::mem::take(&mut repr.states);
        for (old, mut state) in old_states.into_iter().enumerate() {
            if dead[old] {
                continue;
            }
            state.transitions.retain(|tr| !dead[tr.nextstate as usize]);
            for tr in &mut state.transitions {
                tr.nextstate = remap[tr.nextstate as usize];
            }
            repr.states.push(state);
        }
        repr.start = repr.start.and_then(|s| {
            if dead[s as usize] {
                None
            } else {
                Some(remap[s as usize])
            }
        });
        repr.set_props(p);
    }

    fn delete_all_states(&mut self) {
        if Arc::strong_count(&self.repr) > 1 {
            // install a fresh empty cell carrying the symbol tables over,
            // instead of deep-cloning states only to discard them
            let isyms = self.repr.isyms.clone();
            let osyms = self.repr.osyms.clone();
            self.repr = Arc::new(VectorRepr::empty(isyms, osyms));
        } else {
            let repr = self.mutate();
            repr.states.clear();
            repr.start = None;
            repr.set_props(props::empty_properties() | props::EXPANDED | props::MUTABLE);
        }
    }

    fn delete_arcs(&mut self, state: StateId, n: usize) {
        let repr = self.mutate();
        let p = props::delete_properties(repr.props());
        let transitions = &mut repr.states[state as usize].transitions;
        let keep = transitions.len().saturating_sub(n);
        transitions.truncate(keep);
        repr.set_props(p);
    }

    fn delete_all_arcs(&mut self, state: StateId) {
        let repr = self.mutate();
        let p = props::delete_properties(repr.props());
        repr.states[state as usize].transitions.clear();
        repr.set_props(p);
    }

    fn reserve_states(&mut self, n: usize) {
        let repr = self.mutate();
        let additional = n.saturating_sub(repr.states.len());
        repr.states.reserve(additional);
    }

    fn reserve_arcs(&mut self, state: StateId, n: usize) {
        let repr = self.mutate();
        let transitions = &mut repr.states[state as usize].transitions;
        let additional = n.saturating_sub(transitions.len());
        transitions.reserve(additional);
    }

    fn set_input_symbols(&mut self, symbols: Option<SymbolTable>) {
        self.mutate().isyms = symbols;
    }

    fn set_output_symbols(&mut self, symbols: Option<SymbolTable>) {
        self.mutate().osyms = symbols;
    }

    fn input_symbols_mut(&mut self) -> Option<&mut SymbolTable> {
        self.mutate().isyms.as_mut()
    }

    fn output_symbols_mut(&mut self) -> Option<&mut SymbolTable> {
        self.mutate().osyms.as_mut()
    }

    fn arcs_mut(&mut self, state: StateId) -> MutArcIter<'_, W> {
        let repr = self.mutate();
        // the caller may rewrite any transition field
        let p = repr.props() & props::BINARY_PROPERTIES;
        repr.set_props(p);
        MutArcIter::new(&mut repr.states[state as usize].transitions)
    }
}

impl<W: Semiring> VectorFst<W> {
    /// Deserialize the body of a vector container whose header has
    /// already been read.
    pub fn read_body(
        r: &mut dyn io::Read,
        header: &crate::io::FstHeader,
    ) -> Result<Self, FstError> {
        let isyms = if header.flags & crate::io::HAS_INPUT_SYMBOLS != 0 {
            Some(SymbolTable::read(r)?)
        } else {
            None
        };
        let osyms = if header.flags & crate::io::HAS_OUTPUT_SYMBOLS != 0 {
            Some(SymbolTable::read(r)?)
        } else {
            None
        };
        let mut repr = VectorRepr::empty(isyms, osyms);
        for _ in 0..header.num_states {
            let mut state = VectorState::new();
            state.final_weight = W::read_bytes(r)?;
            let mut buf = [0u8; 4];
            r.read_exact(&mut buf)?;
            let arc_count = u32::from_le_bytes(buf);
            state.transitions.reserve(arc_count as usize);
            for _ in 0..arc_count {
                let mut lbl = [0u8; 4];
                r.read_exact(&mut lbl)?;
                let ilabel = u32::from_le_bytes(lbl);
                r.read_exact(&mut lbl)?;
                let olabel = u32::from_le_bytes(lbl);
                let weight = W::read_bytes(r)?;
                r.read_exact(&mut lbl)?;
                let nextstate = u32::from_le_bytes(lbl);
                state
                    .transitions
                    .push(Transition::new(ilabel, olabel, weight, nextstate));
            }
            repr.states.push(state);
        }
        repr.start = header.start;
        repr.set_props(
            (header.properties & props::TRINARY_PROPERTIES)
                | props::EXPANDED
                | props::MUTABLE,
        );
        Ok(Self {
            repr: Arc::new(repr),
        })
    }
}
