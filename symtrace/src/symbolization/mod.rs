//! # Symbol Resolution and Address Translation
//!
//! This module converts raw return addresses captured from the current
//! process into source files, line numbers and function names. This process
//! is called **symbolization** or **symbol resolution**.
//!
//! ## The Symbolization Problem
//!
//! A captured stack holds addresses like `0x55f3a2b4c780`. To describe a
//! frame we need to know:
//! - **Which module** the address belongs to (the executable or one of the
//!   shared libraries mapped into the process)
//! - **Where in that module** it lies, as an offset the module's debug info
//!   understands
//! - **What source line and function** the debug info records there
//!
//! ## Module Base Addresses
//!
//! Position-independent executables and shared libraries are loaded at a
//! randomized base address. Debug info describes addresses as if the module
//! were loaded at zero (or at its link address for non-PIE executables):
//!
//! ```text
//! Runtime Address = Load Base + Module Offset
//! Module Offset   = Runtime Address - Load Base
//! ```
//!
//! The dynamic loader reports each module's load base and its loadable
//! segments, so the owning module is the one with a segment covering the
//! address. The main executable is reported without a name and is opened
//! through `/proc/self/exe`.
//!
//! ## Address Translation Flow
//!
//! ```text
//! 1. Capture yields a frame
//!    ./app(_Z3fooi+0x20) [0x55f3a2b4c780]
//!
//! 2. dl_iterate_phdr: which module has a PT_LOAD segment covering it?
//!    /proc/self/exe, base 0x55f3a2b40000
//!
//! 3. Module offset
//!    0x55f3a2b4c780 - 0x55f3a2b40000 = 0xc780
//!
//! 4. Symbol cache: reuse the open module or switch to it
//!
//! 5. Allocated section containing 0xc780 (.text at 0x1000, size 0x20000)
//!    nearest line for section offset 0xb780 -> app.cpp:42 in _Z3fooi
//!
//! 6. Demangle
//!    _Z3fooi -> foo(int)
//! ```
//!
//! ## Module Structure
//!
//! - **`module_locator`**: loaded-module enumeration and address ownership
//! - **`debug_info`**: the container abstraction (sections, symbol tables,
//!   nearest-line lookup)
//! - **`object_file`**: container backed by `object` and `addr2line`
//! - **`symbol_cache`**: per-module cache of opened containers
//! - **`line_resolver`**: section search and line lookup
//! - **`resolver`**: the `SymbolResolver` trait tying it together
//! - **`dbghelp`** (Windows): resolution through the OS debug-help library
//!
//! ## Limitations
//!
//! - **Requires debug symbols**: without DWARF only symbol names resolve,
//!   and stripped binaries print raw addresses
//! - **Innermost frame only**: inlined callers are not expanded
//! - **No split debug info**: `.gnu_debuglink` and DWO files are not followed

#[cfg(windows)]
pub mod dbghelp;
pub mod debug_info;
pub mod line_resolver;
pub mod module_locator;
pub mod object_file;
pub mod resolver;
pub mod symbol_cache;

pub use debug_info::{
    DebugContainer, DebugInfoLoader, SectionInfo, SymbolEntry, SymbolSource, SymbolTable,
};
pub use line_resolver::resolve_location;
pub use module_locator::{
    locate_module, LoadedModule, MemoryRange, ModuleEnumerator, ModuleMatch, Segment,
    SELF_EXE_PATH,
};
#[cfg(target_os = "linux")]
pub use module_locator::DlPhdrEnumerator;
pub use object_file::{ObjectFile, ObjectLoader};
pub use resolver::{platform_resolver, ObjectSymbolResolver, SymbolResolver, UnsupportedResolver};
pub use symbol_cache::{ModuleSymbolCache, ModuleSymbolContext};
