//! Best-effort symbol demangling
//!
//! Rust symbols (legacy `_ZN...E` and v0 `_R...`) are tried first, then the
//! Itanium C++ ABI. Demangling is advisory: failures return `None` and the
//! caller keeps the mangled name.

use cpp_demangle::{DemangleOptions, Symbol};

/// Demangle a compiler-mangled symbol name
#[must_use]
pub fn demangle(mangled: &str) -> Option<String> {
    if mangled.is_empty() {
        return None;
    }

    if let Ok(symbol) = rustc_demangle::try_demangle(mangled) {
        // Alternate form drops the trailing hash
        return Some(format!("{symbol:#}"));
    }

    // Bare type encodings ("f", "Ss") are not function names
    let itanium = mangled.strip_prefix('_').filter(|rest| rest.starts_with("_Z")).unwrap_or(mangled);
    if !itanium.starts_with("_Z") {
        return None;
    }
    let symbol = Symbol::new(itanium).ok()?;
    symbol.demangle(&DemangleOptions::default()).ok()
}

/// Demangle `name`, falling back to the input unchanged
#[must_use]
pub fn demangle_or_keep(name: &str) -> String {
    demangle(name).unwrap_or_else(|| name.to_string())
}
