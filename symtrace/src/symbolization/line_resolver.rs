//! Mapping a module-relative offset to a source line
//!
//! The offset is matched against the allocated sections of the module's
//! container; the containing section performs the nearest-line lookup with
//! the offset rebased to the section start.

use log::debug;

use super::debug_info::{DebugContainer, SectionInfo, SymbolTable};
use crate::domain::ResolvedLocation;

/// Allocated sections whose runtime range contains `offset`, in container order
pub fn containing_sections(
    sections: &[SectionInfo],
    offset: u64,
) -> impl Iterator<Item = &SectionInfo> {
    sections.iter().filter(move |section| section.allocated && section.contains(offset))
}

/// Resolve `offset` (relative to the module's load base) to file, line and function
///
/// Returns `None` when no allocated section contains the offset or the
/// containing section has no line or symbol data for it.
pub fn resolve_location<C: DebugContainer + ?Sized>(
    container: &C,
    symbols: &SymbolTable,
    offset: u64,
) -> Option<ResolvedLocation> {
    let resolved = containing_sections(container.sections(), offset).find_map(|section| {
        container.find_nearest_line(section, symbols, offset - section.address)
    });

    if resolved.is_none() {
        debug!("No section resolves offset 0x{offset:x}");
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolization::debug_info::SymbolSource;
    use std::cell::RefCell;

    /// Container answering from a fixed table, recording every lookup
    struct TableContainer {
        sections: Vec<SectionInfo>,
        lines: Vec<(usize, u64, ResolvedLocation)>,
        lookups: RefCell<Vec<(usize, u64)>>,
    }

    impl DebugContainer for TableContainer {
        fn sections(&self) -> &[SectionInfo] {
            &self.sections
        }

        fn has_symbol_table(&self) -> bool {
            false
        }

        fn read_symbols(&self, _source: SymbolSource) -> SymbolTable {
            SymbolTable::default()
        }

        fn find_nearest_line(
            &self,
            section: &SectionInfo,
            _symbols: &SymbolTable,
            offset: u64,
        ) -> Option<ResolvedLocation> {
            self.lookups.borrow_mut().push((section.index, offset));
            self.lines
                .iter()
                .find(|(index, at, _)| *index == section.index && *at == offset)
                .map(|(_, _, location)| location.clone())
        }
    }

    fn location(file: &str, line: u32, function: &str) -> ResolvedLocation {
        ResolvedLocation {
            file: Some(file.to_string()),
            line: Some(line),
            function: Some(function.to_string()),
        }
    }

    fn container() -> TableContainer {
        TableContainer {
            sections: vec![
                SectionInfo { index: 0, address: 0, size: 0, allocated: false },
                // Non-allocated debug section overlapping .text
                SectionInfo { index: 1, address: 0x1000, size: 0x4000, allocated: false },
                SectionInfo { index: 2, address: 0x1000, size: 0x2000, allocated: true },
                SectionInfo { index: 3, address: 0x4000, size: 0x100, allocated: true },
            ],
            lines: vec![
                (2, 0x20, location("src/app.cpp", 42, "_Z3fooi")),
                (3, 0x10, location("src/init.cpp", 7, "init")),
            ],
            lookups: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn test_resolves_exact_triple() {
        let container = container();
        let resolved = resolve_location(&container, &SymbolTable::default(), 0x1020).unwrap();
        assert_eq!(resolved, location("src/app.cpp", 42, "_Z3fooi"));
        // Lookup was rebased to the section start
        assert_eq!(*container.lookups.borrow(), vec![(2, 0x20)]);
    }

    #[test]
    fn test_resolves_in_later_section() {
        let container = container();
        let resolved = resolve_location(&container, &SymbolTable::default(), 0x4010).unwrap();
        assert_eq!(resolved.function.as_deref(), Some("init"));
    }

    #[test]
    fn test_skips_non_allocated_sections() {
        let container = container();
        // Inside the debug section only
        assert!(resolve_location(&container, &SymbolTable::default(), 0x3800).is_none());
        assert!(container.lookups.borrow().is_empty());
    }

    #[test]
    fn test_offset_outside_all_sections() {
        let container = container();
        assert!(resolve_location(&container, &SymbolTable::default(), 0x9000).is_none());
        assert!(resolve_location(&container, &SymbolTable::default(), 0x4100).is_none());
    }

    #[test]
    fn test_containing_sections_order() {
        let container = container();
        let found: Vec<usize> =
            containing_sections(container.sections(), 0x1800).map(|s| s.index).collect();
        assert_eq!(found, vec![2]);
    }
}
