// Explicit fst-type registry and the polymorphic read entry points.
//
// The registry maps a representation tag to its reader within one arc
// (weight) type instantiation; the embedding application builds it once
// and passes it to the read operations explicitly. Nothing registers
// itself behind the caller's back, so there is no hidden global state and
// no load-order sensitivity.

use std::io::Read;

use hashbrown::HashMap;

use polku_weight::Semiring;

use crate::io::FstHeader;
use crate::properties::MUTABLE;
use crate::traits::{Fst, MutableFst};
use crate::vector::{VECTOR_FST_TYPE, VectorFst};
use crate::FstError;

/// Reader for one registered representation: consumes the body following
/// an already-read header.
pub type FstReadFn<W> =
    fn(&mut dyn Read, &FstHeader) -> Result<Box<dyn MutableFst<W = W>>, FstError>;

/// Registry of representation readers for one weight type.
pub struct FstRegistry<W: Semiring> {
    readers: HashMap<String, FstReadFn<W>>,
}

impl<W: Semiring> FstRegistry<W> {
    pub fn new() -> Self {
        Self {
            readers: HashMap::new(),
        }
    }

    /// Registry with every representation this crate ships: currently the
    /// vector type.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(VECTOR_FST_TYPE, |r, header| {
            Ok(Box::new(VectorFst::<W>::read_body(r, header)?))
        });
        registry
    }

    /// Register a reader under its representation tag, replacing any
    /// previous registration of the same tag.
    pub fn register(&mut self, fst_type: &str, reader: FstReadFn<W>) {
        self.readers.insert(fst_type.to_string(), reader);
    }

    pub fn reader(&self, fst_type: &str) -> Option<FstReadFn<W>> {
        self.readers.get(fst_type).copied()
    }
}

impl<W: Semiring> Default for FstRegistry<W> {
    fn default() -> Self {
        Self::standard()
    }
}

/// Read any registered transducer. `origin` names the input in
/// diagnostics. Fails on a bad header, an arc-type mismatch or an
/// unknown representation tag; it never substitutes a default
/// representation.
pub fn read_fst<W: Semiring>(
    r: &mut dyn Read,
    origin: &str,
    registry: &FstRegistry<W>,
) -> Result<Box<dyn Fst<W = W>>, FstError> {
    let fst = read_with_header(r, origin, registry, false)?;
    Ok(fst)
}

/// Read a transducer through the mutable entry point. Fails additionally
/// when the header does not record a mutable representation; callers
/// holding a non-mutable container must convert explicitly (see
/// [`VectorFst::from_fst`]).
pub fn read_mutable_fst<W: Semiring>(
    r: &mut dyn Read,
    origin: &str,
    registry: &FstRegistry<W>,
) -> Result<Box<dyn MutableFst<W = W>>, FstError> {
    read_with_header(r, origin, registry, true)
}

fn read_with_header<W: Semiring>(
    r: &mut dyn Read,
    origin: &str,
    registry: &FstRegistry<W>,
    require_mutable: bool,
) -> Result<Box<dyn MutableFst<W = W>>, FstError> {
    let header = FstHeader::read(r, origin)?;
    let expected = W::type_name();
    if header.arc_type != expected {
        tracing::error!(
            origin,
            expected = %expected,
            found = %header.arc_type,
            "arc type mismatch"
        );
        return Err(FstError::ArcTypeMismatch {
            expected,
            found: header.arc_type,
            origin: origin.to_string(),
        });
    }
    if require_mutable && header.properties & MUTABLE == 0 {
        tracing::error!(origin, fst_type = %header.fst_type, "not a mutable fst");
        return Err(FstError::NotMutable {
            origin: origin.to_string(),
        });
    }
    let Some(reader) = registry.reader(&header.fst_type) else {
        tracing::error!(origin, fst_type = %header.fst_type, "unknown fst type");
        return Err(FstError::UnknownFstType {
            fst_type: header.fst_type,
            origin: origin.to_string(),
        });
    };
    reader(r, &header)
}
