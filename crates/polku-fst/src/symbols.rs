// Symbol table: label-to-string and string-to-label mapping.

use std::io;

use hashbrown::HashMap;

use crate::{FstError, Label};

/// Interning table mapping labels to symbol strings and back.
///
/// Labels are assigned densely in insertion order, starting at 0 which by
/// convention holds the epsilon symbol. The table is an independently
/// owned side structure: transducers hold, copy, clear or replace it
/// wholesale but never edit entries on an algorithm's behalf.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    name: String,
    symbols: Vec<String>,
    index: HashMap<String, Label>,
}

impl SymbolTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Intern a symbol, returning its label. Re-adding an existing symbol
    /// returns the original label.
    pub fn add_symbol(&mut self, symbol: impl Into<String>) -> Label {
        let symbol = symbol.into();
        if let Some(&label) = self.index.get(&symbol) {
            return label;
        }
        let label = self.symbols.len() as Label;
        self.index.insert(symbol.clone(), label);
        self.symbols.push(symbol);
        label
    }

    pub fn symbol(&self, label: Label) -> Option<&str> {
        self.symbols.get(label as usize).map(String::as_str)
    }

    pub fn label(&self, symbol: &str) -> Option<Label> {
        self.index.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, &str)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (i as Label, s.as_str()))
    }

    /// Serialize as a little-endian count followed by NUL-terminated
    /// symbol strings in label order; the table name comes first.
    pub fn write<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), FstError> {
        write_nul_string(w, &self.name)?;
        w.write_all(&(self.symbols.len() as u32).to_le_bytes())?;
        for symbol in &self.symbols {
            write_nul_string(w, symbol)?;
        }
        Ok(())
    }

    pub fn read<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, FstError> {
        let name = read_nul_string(r)?;
        let mut buf = [0u8; 4];
        r.read_exact(&mut buf)?;
        let count = u32::from_le_bytes(buf);
        let mut table = Self::new(name);
        for _ in 0..count {
            table.add_symbol(read_nul_string(r)?);
        }
        Ok(table)
    }
}

/// Equality by content: same symbols under the same labels. The table
/// name is presentation only.
impl PartialEq for SymbolTable {
    fn eq(&self, other: &Self) -> bool {
        self.symbols == other.symbols
    }
}

impl Eq for SymbolTable {}

pub(crate) fn write_nul_string<W: io::Write + ?Sized>(w: &mut W, s: &str) -> Result<(), FstError> {
    w.write_all(s.as_bytes())?;
    w.write_all(&[0])?;
    Ok(())
}

pub(crate) fn read_nul_string<R: io::Read + ?Sized>(r: &mut R) -> Result<String, FstError> {
    let mut bytes = Vec::new();
    let mut buf = [0u8; 1];
    loop {
        r.read_exact(&mut buf)?;
        if buf[0] == 0 {
            break;
        }
        bytes.push(buf[0]);
    }
    String::from_utf8(bytes)
        .map_err(|e| FstError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SymbolTable {
        let mut t = SymbolTable::new("letters");
        t.add_symbol("<eps>");
        t.add_symbol("a");
        t.add_symbol("b");
        t
    }

    #[test]
    fn interning_assigns_dense_labels() {
        let t = table();
        assert_eq!(t.len(), 3);
        assert_eq!(t.label("<eps>"), Some(0));
        assert_eq!(t.label("a"), Some(1));
        assert_eq!(t.symbol(2), Some("b"));
        assert_eq!(t.symbol(3), None);
        assert_eq!(t.label("c"), None);
    }

    #[test]
    fn re_adding_returns_existing_label() {
        let mut t = table();
        assert_eq!(t.add_symbol("a"), 1);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn content_equality_ignores_name() {
        let a = table();
        let mut b = SymbolTable::new("other");
        b.add_symbol("<eps>");
        b.add_symbol("a");
        b.add_symbol("b");
        assert_eq!(a, b);
        b.add_symbol("c");
        assert_ne!(a, b);
    }

    #[test]
    fn clone_is_independent() {
        let a = table();
        let mut b = a.clone();
        b.add_symbol("z");
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn binary_round_trip() {
        let t = table();
        let mut buf = Vec::new();
        t.write(&mut buf).unwrap();
        let back = SymbolTable::read(&mut buf.as_slice()).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.name(), "letters");
    }

    #[test]
    fn read_rejects_truncated_data() {
        let t = table();
        let mut buf = Vec::new();
        t.write(&mut buf).unwrap();
        buf.truncate(buf.len() - 2);
        assert!(SymbolTable::read(&mut buf.as_slice()).is_err());
    }
}
