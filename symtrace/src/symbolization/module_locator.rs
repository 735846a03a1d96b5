//! Locating the loaded module that owns a runtime address
//!
//! Every loaded module (the executable and each shared library) is mapped as
//! a set of loadable segments. A segment's runtime range is its virtual
//! address from the program headers plus the module's load base, so the
//! owning module of an address is the one with a segment covering it.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use crate::domain::Address;

/// Path used for the running executable, which the loader reports unnamed
pub const SELF_EXE_PATH: &str = "/proc/self/exe";

/// Memory range in a process's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    pub start: u64,
    pub end: u64,
}

impl MemoryRange {
    /// Check if an address falls within this memory range
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// One loadable segment (`PT_LOAD`) of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub vaddr: u64,
    pub size: u64,
}

impl Segment {
    /// Runtime range of this segment once the module is loaded at `base`
    ///
    /// Returns `None` when the range would overflow the address space.
    #[must_use]
    pub fn runtime_range(&self, base: u64) -> Option<MemoryRange> {
        let start = self.vaddr.checked_add(base)?;
        let end = start.checked_add(self.size)?;
        Some(MemoryRange { start, end })
    }
}

/// A module currently mapped into the process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    /// Reported path; empty for the main executable
    pub path: PathBuf,
    pub base: u64,
    pub segments: Vec<Segment>,
}

impl LoadedModule {
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        self.segments
            .iter()
            .filter_map(|segment| segment.runtime_range(self.base))
            .any(|range| range.contains(addr))
    }
}

/// Result of locating the module for an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatch {
    pub path: PathBuf,
    pub base: u64,
}

impl ModuleMatch {
    /// Path to open for debug info; the unnamed main executable maps to
    /// [`SELF_EXE_PATH`]
    #[must_use]
    pub fn symbol_path(&self) -> &Path {
        if self.path.as_os_str().is_empty() {
            Path::new(SELF_EXE_PATH)
        } else {
            &self.path
        }
    }

    /// Offset of `addr` relative to the module's load base
    #[must_use]
    pub fn relative(&self, addr: Address) -> u64 {
        addr.relative_to(self.base)
    }
}

/// Enumerates the modules loaded into the current process
pub trait ModuleEnumerator {
    /// Visit each module until the visitor breaks
    fn for_each_module(&self, visit: &mut dyn FnMut(&LoadedModule) -> ControlFlow<()>);
}

/// A fixed module list, for replaying a captured layout
impl ModuleEnumerator for Vec<LoadedModule> {
    fn for_each_module(&self, visit: &mut dyn FnMut(&LoadedModule) -> ControlFlow<()>) {
        for module in self {
            if visit(module).is_break() {
                break;
            }
        }
    }
}

/// Find the module whose loadable segments contain `addr`
///
/// The first matching module wins and stops the enumeration.
pub fn locate_module<E: ModuleEnumerator + ?Sized>(
    enumerator: &E,
    addr: Address,
) -> Option<ModuleMatch> {
    let mut found = None;
    enumerator.for_each_module(&mut |module| {
        if module.contains(addr.0) {
            found = Some(ModuleMatch { path: module.path.clone(), base: module.base });
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    found
}

#[cfg(target_os = "linux")]
pub use self::dl_phdr::DlPhdrEnumerator;

#[cfg(target_os = "linux")]
mod dl_phdr {
    #![allow(unsafe_code)] // dl_iterate_phdr is a C callback API

    use std::ffi::{c_int, c_void, CStr, OsStr};
    use std::ops::ControlFlow;
    use std::os::unix::ffi::OsStrExt;
    use std::path::PathBuf;

    use super::{LoadedModule, ModuleEnumerator, Segment};

    type Visitor<'a> = dyn FnMut(&LoadedModule) -> ControlFlow<()> + 'a;

    /// Walks the dynamic loader's module list via `dl_iterate_phdr`
    #[derive(Debug, Clone, Copy, Default)]
    pub struct DlPhdrEnumerator;

    impl ModuleEnumerator for DlPhdrEnumerator {
        fn for_each_module(&self, visit: &mut dyn FnMut(&LoadedModule) -> ControlFlow<()>) {
            let mut visit: &mut Visitor<'_> = visit;
            let data = std::ptr::addr_of_mut!(visit).cast::<c_void>();
            // SAFETY: `data` points at `visit`, which outlives the call
            unsafe {
                libc::dl_iterate_phdr(Some(callback), data);
            }
        }
    }

    unsafe extern "C" fn callback(
        info: *mut libc::dl_phdr_info,
        _size: libc::size_t,
        data: *mut c_void,
    ) -> c_int {
        // SAFETY: the loader passes a valid info record and our `data` pointer
        let (info, visit): (_, &mut Visitor<'_>) =
            unsafe { (&*info, &mut **data.cast::<&mut Visitor<'_>>()) };

        let path = if info.dlpi_name.is_null() {
            PathBuf::new()
        } else {
            // SAFETY: dlpi_name is a NUL-terminated string owned by the loader
            let name = unsafe { CStr::from_ptr(info.dlpi_name) };
            PathBuf::from(OsStr::from_bytes(name.to_bytes()))
        };

        let headers = if info.dlpi_phdr.is_null() {
            &[][..]
        } else {
            // SAFETY: dlpi_phdr points at dlpi_phnum program headers
            unsafe { std::slice::from_raw_parts(info.dlpi_phdr, usize::from(info.dlpi_phnum)) }
        };

        let segments = headers
            .iter()
            .filter(|phdr| phdr.p_type == libc::PT_LOAD)
            .map(|phdr| Segment { vaddr: u64::from(phdr.p_vaddr), size: u64::from(phdr.p_memsz) })
            .collect();

        let module = LoadedModule { path, base: u64::from(info.dlpi_addr), segments };
        match visit(&module) {
            ControlFlow::Break(()) => 1,
            ControlFlow::Continue(()) => 0,
        }
    }
}
