//! Object-file backed debug-info container
//!
//! Sections and symbol tables come from the `object` crate; line lookup goes
//! through an `addr2line` context built over the file's DWARF sections.

use addr2line::Context;
use gimli::{EndianRcSlice, RunTimeEndian};
use log::debug;
use object::{FileKind, Object, ObjectSection, ObjectSymbol, SectionFlags};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::debug_info::{
    DebugContainer, DebugInfoLoader, SectionInfo, SymbolEntry, SymbolSource, SymbolTable,
};
use crate::domain::{ResolvedLocation, SymbolizeError};

type Dwarf = Context<EndianRcSlice<RunTimeEndian>>;

/// An opened ELF binary with its DWARF line tables
pub struct ObjectFile {
    path: PathBuf,
    data: Vec<u8>,
    sections: Vec<SectionInfo>,
    has_symbol_table: bool,
    dwarf: Option<Dwarf>,
}

impl ObjectFile {
    /// Open and parse the binary at `path`
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is an archive, or is not an
    /// object file of a supported format
    pub fn open(path: &Path) -> Result<Self, SymbolizeError> {
        let data = fs::read(path)
            .map_err(|source| SymbolizeError::Open { path: path.to_path_buf(), source })?;

        match FileKind::parse(&*data) {
            Ok(FileKind::Archive) => return Err(SymbolizeError::Archive(path.to_path_buf())),
            Ok(_) => {}
            Err(e) => {
                return Err(SymbolizeError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }

        let obj_file = object::File::parse(&*data).map_err(|e| {
            SymbolizeError::UnsupportedFormat { path: path.to_path_buf(), reason: e.to_string() }
        })?;

        let sections = obj_file
            .sections()
            .map(|section| SectionInfo {
                index: section.index().0,
                address: section.address(),
                size: section.size(),
                allocated: is_allocated(&section),
            })
            .collect();
        let has_symbol_table =
            obj_file.symbol_table().is_some() || obj_file.dynamic_symbol_table().is_some();
        let dwarf = load_dwarf(&obj_file, path);

        Ok(Self { path: path.to_path_buf(), data, sections, has_symbol_table, dwarf })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether DWARF line information was loaded
    #[must_use]
    pub fn has_dwarf(&self) -> bool {
        self.dwarf.is_some()
    }

    fn lookup_dwarf(&self, vaddr: u64) -> ResolvedLocation {
        let mut location = ResolvedLocation::default();
        let Some(ctx) = self.dwarf.as_ref() else {
            return location;
        };

        // Innermost frame first; inlined callers are not reported
        if let Ok(mut frame_iter) = ctx.find_frames(vaddr).skip_all_loads() {
            if let Ok(Some(frame)) = frame_iter.next() {
                location.function = frame
                    .function
                    .as_ref()
                    .and_then(|f| f.raw_name().ok().map(Cow::into_owned));
                if let Some(loc) = frame.location {
                    location.file = loc.file.map(str::to_string);
                    location.line = loc.line;
                }
            }
        }

        if location.file.is_none() {
            if let Ok(Some(loc)) = ctx.find_location(vaddr) {
                location.file = loc.file.map(str::to_string);
                location.line = loc.line;
            }
        }

        location
    }
}

impl DebugContainer for ObjectFile {
    fn sections(&self) -> &[SectionInfo] {
        &self.sections
    }

    fn has_symbol_table(&self) -> bool {
        self.has_symbol_table
    }

    fn read_symbols(&self, source: SymbolSource) -> SymbolTable {
        let Ok(obj_file) = object::File::parse(&*self.data) else {
            return SymbolTable::default();
        };

        let entries = match source {
            SymbolSource::Static => obj_file.symbols().filter_map(|s| text_symbol(&s)).collect(),
            SymbolSource::Dynamic => {
                obj_file.dynamic_symbols().filter_map(|s| text_symbol(&s)).collect()
            }
        };
        SymbolTable::new(entries)
    }

    fn find_nearest_line(
        &self,
        section: &SectionInfo,
        symbols: &SymbolTable,
        offset: u64,
    ) -> Option<ResolvedLocation> {
        let vaddr = section.address.checked_add(offset)?;
        let mut location = self.lookup_dwarf(vaddr);

        if location.function_name().is_none() {
            location.function = symbols.nearest(vaddr).map(|symbol| symbol.name.clone());
        }

        (!location.is_empty()).then_some(location)
    }
}

/// Loads [`ObjectFile`] containers from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectLoader;

impl DebugInfoLoader for ObjectLoader {
    type Container = ObjectFile;

    fn open(&self, path: &Path) -> Result<ObjectFile, SymbolizeError> {
        ObjectFile::open(path)
    }
}

fn is_allocated(section: &object::Section<'_, '_>) -> bool {
    match section.flags() {
        SectionFlags::Elf { sh_flags } => sh_flags & u64::from(object::elf::SHF_ALLOC) != 0,
        _ => section.address() != 0,
    }
}

fn text_symbol(symbol: &object::Symbol<'_, '_>) -> Option<SymbolEntry> {
    if !symbol.is_definition() || symbol.kind() != object::SymbolKind::Text {
        return None;
    }
    let name = symbol.name().ok().filter(|name| !name.is_empty())?;
    Some(SymbolEntry { address: symbol.address(), size: symbol.size(), name: name.to_string() })
}

fn load_dwarf(obj_file: &object::File<'_>, path: &Path) -> Option<Dwarf> {
    let endian =
        if obj_file.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

    let load_section = |id: gimli::SectionId| -> Result<EndianRcSlice<RunTimeEndian>, gimli::Error> {
        let data = obj_file
            .section_by_name(id.name())
            .and_then(|section| section.uncompressed_data().ok())
            .unwrap_or(Cow::Borrowed(&[][..]));
        Ok(EndianRcSlice::new(Rc::from(&*data), endian))
    };

    let dwarf = match gimli::Dwarf::load(&load_section) {
        Ok(dwarf) => dwarf,
        Err(e) => {
            debug!("Failed to load DWARF sections from {}: {e}", path.display());
            return None;
        }
    };

    match Context::from_dwarf(dwarf) {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            debug!("Failed to build line tables for {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_missing_file() {
        let err = ObjectFile::open(Path::new("/nonexistent/symtrace-test")).err().unwrap();
        assert!(matches!(err, SymbolizeError::Open { .. }));
    }

    #[test]
    fn test_open_archive_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // Magic plus one member header's worth of padding
        file.write_all(b"!<arch>\n").unwrap();
        file.write_all(&[b' '; 60]).unwrap();

        let err = ObjectFile::open(file.path()).err().unwrap();
        assert!(matches!(err, SymbolizeError::Archive(_)));
    }

    #[test]
    fn test_open_text_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an object file").unwrap();

        let err = ObjectFile::open(file.path()).err().unwrap();
        assert!(matches!(err, SymbolizeError::UnsupportedFormat { .. }));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_open_own_test_binary() {
        let exe = std::env::current_exe().unwrap();
        let file = ObjectFile::open(&exe).unwrap();

        assert_eq!(file.path(), exe.as_path());
        assert!(file.sections().iter().any(|s| s.allocated && s.size > 0));
        assert!(file.has_symbol_table());
        assert!(!file.read_symbols(SymbolSource::Static).is_empty());
    }
}
