//! Debug-info container abstraction
//!
//! A container is an opened binary: its section table, its symbol tables and
//! a nearest-line lookup. The object-file implementation lives in
//! [`super::object_file`]; tests provide in-memory containers.

use std::path::Path;

use crate::domain::{ResolvedLocation, SymbolizeError};

/// One section of an opened binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionInfo {
    pub index: usize,
    pub address: u64,
    pub size: u64,
    /// Section occupies address space at runtime (`SHF_ALLOC`)
    pub allocated: bool,
}

impl SectionInfo {
    /// Check if a module-relative offset falls within `[address, address + size)`
    #[must_use]
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.address && offset - self.address < self.size
    }
}

/// Which of a binary's symbol tables to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolSource {
    /// The full symbol table (`.symtab`)
    Static,
    /// The dynamic symbol table (`.dynsym`)
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub address: u64,
    pub size: u64,
    pub name: String,
}

impl SymbolEntry {
    fn covers(&self, address: u64) -> bool {
        // Zero-sized symbols extend to the next symbol
        self.size == 0 || address - self.address < self.size
    }
}

/// Address-ordered symbol table of one module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
}

impl SymbolTable {
    #[must_use]
    pub fn new(mut entries: Vec<SymbolEntry>) -> Self {
        entries.sort_by_key(|entry| entry.address);
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the closest symbol that starts at or before `address` and covers it
    ///
    /// A short symbol nested inside a larger one (an alias or local label)
    /// does not hide the enclosing symbol past its own end.
    #[must_use]
    pub fn nearest(&self, address: u64) -> Option<&SymbolEntry> {
        let idx = self.entries.partition_point(|entry| entry.address <= address);
        let (closest, earlier) = self.entries[..idx].split_last()?;
        if closest.covers(address) {
            return Some(closest);
        }
        // Only sized symbols can enclose a later one
        earlier
            .iter()
            .rev()
            .find(|entry| entry.size != 0 && address - entry.address < entry.size)
    }
}

/// An opened binary's debug information
pub trait DebugContainer {
    /// Sections in a stable order
    fn sections(&self) -> &[SectionInfo];

    /// Whether the file declares any symbol table at all
    fn has_symbol_table(&self) -> bool;

    /// Read one symbol table; missing tables read as empty
    fn read_symbols(&self, source: SymbolSource) -> SymbolTable;

    /// Nearest source line and function for `offset` bytes into `section`
    fn find_nearest_line(
        &self,
        section: &SectionInfo,
        symbols: &SymbolTable,
        offset: u64,
    ) -> Option<ResolvedLocation>;
}

/// Opens debug-info containers by path
pub trait DebugInfoLoader {
    type Container: DebugContainer;

    /// Open the binary at `path`
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is an archive, or is not an
    /// object file of a supported format
    fn open(&self, path: &Path) -> Result<Self::Container, SymbolizeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(address: u64, size: u64, name: &str) -> SymbolEntry {
        SymbolEntry { address, size, name: name.to_string() }
    }

    #[test]
    fn test_section_contains() {
        let section = SectionInfo { index: 1, address: 0x1000, size: 0x1000, allocated: true };

        assert!(section.contains(0x1000));
        assert!(section.contains(0x1500));
        assert!(section.contains(0x1FFF));
        assert!(!section.contains(0x0FFF));
        assert!(!section.contains(0x2000));
    }

    #[test]
    fn test_empty_section_contains_nothing() {
        let section = SectionInfo { index: 0, address: 0x1000, size: 0, allocated: true };
        assert!(!section.contains(0x1000));
    }

    #[test]
    fn test_nearest_symbol() {
        let table =
            SymbolTable::new(vec![entry(0x2000, 0x10, "bar"), entry(0x1000, 0x100, "foo")]);

        assert_eq!(table.nearest(0x1000).map(|s| s.name.as_str()), Some("foo"));
        assert_eq!(table.nearest(0x10ff).map(|s| s.name.as_str()), Some("foo"));
        assert_eq!(table.nearest(0x2008).map(|s| s.name.as_str()), Some("bar"));
        // Past the end of foo, before bar
        assert!(table.nearest(0x1100).is_none());
        // Before the first symbol
        assert!(table.nearest(0x0fff).is_none());
    }

    #[test]
    fn test_enclosing_symbol_covers_past_nested_alias() {
        let table = SymbolTable::new(vec![
            entry(0x1000, 0x1000, "outer"),
            entry(0x1100, 0x10, "inner_alias"),
        ]);

        assert_eq!(table.nearest(0x1108).map(|s| s.name.as_str()), Some("inner_alias"));
        assert_eq!(table.nearest(0x1200).map(|s| s.name.as_str()), Some("outer"));
        assert!(table.nearest(0x2000).is_none());
    }

    #[test]
    fn test_zero_sized_symbol_stops_at_next_symbol() {
        let table =
            SymbolTable::new(vec![entry(0x1000, 0, "_start"), entry(0x2000, 0x10, "foo")]);
        assert!(table.nearest(0x2100).is_none());
    }

    #[test]
    fn test_zero_sized_symbol_extends() {
        let table = SymbolTable::new(vec![entry(0x1000, 0, "_start")]);
        assert_eq!(table.nearest(0x1234).map(|s| s.name.as_str()), Some("_start"));
    }

    #[test]
    fn test_empty_table() {
        let table = SymbolTable::default();
        assert!(table.is_empty());
        assert!(table.nearest(0x1000).is_none());
    }
}
