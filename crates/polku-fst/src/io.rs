// Binary container format: header encoding and the generic writer.
//
// Layout: header (magic, version, fst-type and arc-type tags, flags,
// properties, start, counts), then the optional symbol tables, then the
// representation body. All integers little-endian, all tags
// NUL-terminated. Reading back what was written yields a behaviorally
// equivalent transducer; the byte stream itself is not canonical.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use polku_weight::Semiring;

use crate::symbols::{read_nul_string, write_nul_string};
use crate::traits::{ExpandedFst, Fst};
use crate::{FstError, StateId};

/// Container magic, "pfst" in little-endian byte order.
pub const FST_MAGIC: u32 = u32::from_le_bytes(*b"pfst");

/// Current container format version.
pub const FST_FORMAT_VERSION: u32 = 1;

/// Header flag: an input symbol table follows the header.
pub const HAS_INPUT_SYMBOLS: u32 = 1 << 0;
/// Header flag: an output symbol table follows the input table.
pub const HAS_OUTPUT_SYMBOLS: u32 = 1 << 1;

const NO_STATE: u32 = u32::MAX;

/// Parsed container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FstHeader {
    pub fst_type: String,
    pub arc_type: String,
    pub flags: u32,
    pub properties: u64,
    pub start: Option<StateId>,
    pub num_states: u64,
    pub num_arcs: u64,
}

impl FstHeader {
    /// Read and validate a header. `origin` names the input for
    /// diagnostics only.
    pub fn read<R: Read + ?Sized>(r: &mut R, origin: &str) -> Result<Self, FstError> {
        let magic = read_u32(r)?;
        if magic != FST_MAGIC {
            return Err(FstError::BadMagic {
                origin: origin.to_string(),
            });
        }
        let version = read_u32(r)?;
        if version != FST_FORMAT_VERSION {
            return Err(FstError::UnsupportedVersion {
                version,
                origin: origin.to_string(),
            });
        }
        let fst_type = read_nul_string(r)?;
        let arc_type = read_nul_string(r)?;
        let flags = read_u32(r)?;
        let properties = read_u64(r)?;
        let start = match read_u32(r)? {
            NO_STATE => None,
            s => Some(s),
        };
        let num_states = read_u64(r)?;
        let num_arcs = read_u64(r)?;
        Ok(Self {
            fst_type,
            arc_type,
            flags,
            properties,
            start,
            num_states,
            num_arcs,
        })
    }

    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), FstError> {
        w.write_all(&FST_MAGIC.to_le_bytes())?;
        w.write_all(&FST_FORMAT_VERSION.to_le_bytes())?;
        write_nul_string(w, &self.fst_type)?;
        write_nul_string(w, &self.arc_type)?;
        w.write_all(&self.flags.to_le_bytes())?;
        w.write_all(&self.properties.to_le_bytes())?;
        w.write_all(&self.start.unwrap_or(NO_STATE).to_le_bytes())?;
        w.write_all(&self.num_states.to_le_bytes())?;
        w.write_all(&self.num_arcs.to_le_bytes())?;
        Ok(())
    }
}

/// Serialize a fully instantiated transducer: header, symbol tables, then
/// per state the final weight, transition count and transitions.
pub fn write_fst<F: ExpandedFst + ?Sized>(fst: &F, w: &mut dyn Write) -> Result<(), FstError> {
    let num_states = fst.num_states();
    let mut num_arcs = 0u64;
    for s in 0..num_states as StateId {
        num_arcs += fst.num_arcs(s) as u64;
    }
    let mut flags = 0;
    if fst.input_symbols().is_some() {
        flags |= HAS_INPUT_SYMBOLS;
    }
    if fst.output_symbols().is_some() {
        flags |= HAS_OUTPUT_SYMBOLS;
    }
    let header = FstHeader {
        fst_type: fst.fst_type().to_string(),
        arc_type: F::W::type_name(),
        flags,
        properties: fst.properties(crate::properties::ALL_PROPERTIES, false),
        start: fst.start(),
        num_states: num_states as u64,
        num_arcs,
    };
    header.write(w)?;
    if let Some(syms) = fst.input_symbols() {
        syms.write(w)?;
    }
    if let Some(syms) = fst.output_symbols() {
        syms.write(w)?;
    }
    for s in 0..num_states as StateId {
        fst.final_weight(s).write_bytes(w)?;
        w.write_all(&(fst.num_arcs(s) as u32).to_le_bytes())?;
        let mut aiter = fst.arcs(s);
        while !aiter.done() {
            let tr = aiter.value();
            w.write_all(&tr.ilabel.to_le_bytes())?;
            w.write_all(&tr.olabel.to_le_bytes())?;
            tr.weight.write_bytes(w)?;
            w.write_all(&tr.nextstate.to_le_bytes())?;
            aiter.next();
        }
    }
    Ok(())
}

/// Serialize to a file path.
pub fn write_fst_to_path<F: ExpandedFst + ?Sized>(
    fst: &F,
    path: impl AsRef<Path>,
) -> Result<(), FstError> {
    let mut w = BufWriter::new(File::create(path)?);
    write_fst(fst, &mut w)?;
    w.flush()?;
    Ok(())
}

/// Open a file for registry-driven reading; see
/// [`crate::registry::read_fst`].
pub fn open_fst_file(path: impl AsRef<Path>) -> Result<(BufReader<File>, String), FstError> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    let file = File::open(path)?;
    Ok((BufReader::new(file), origin))
}

fn read_u32<R: Read + ?Sized>(r: &mut R) -> Result<u32, FstError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read + ?Sized>(r: &mut R) -> Result<u64, FstError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}
