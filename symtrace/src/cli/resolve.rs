//! `symtrace resolve`: offline resolution of offsets inside one binary

use anyhow::{bail, Context, Result};
use log::info;
use std::io::Write;
use std::path::Path;

use crate::config::TraceConfig;
use crate::domain::Address;
use crate::printer::format_location;
use crate::symbolization::{ModuleSymbolCache, ObjectLoader};

/// Parse a hexadecimal module-relative offset
///
/// # Errors
/// Returns an error naming the text if it is not hexadecimal
pub fn parse_offset(text: &str) -> Result<u64> {
    match Address::parse_hex(text) {
        Some(addr) => Ok(addr.0),
        None => bail!("Invalid offset {text:?}: expected hexadecimal"),
    }
}

/// Resolve each offset in `exe` and write one line per offset
///
/// Resolved offsets print as `<file>:<line> <function>`, unresolved ones as
/// the bare hex offset.
///
/// # Errors
/// Returns an error if an offset is malformed, `exe` cannot be opened, or
/// writing fails
pub fn resolve_offsets<W: Write + ?Sized>(
    exe: &Path,
    offsets: &[String],
    config: &TraceConfig,
    out: &mut W,
) -> Result<()> {
    let offsets = offsets.iter().map(|text| parse_offset(text)).collect::<Result<Vec<_>>>()?;

    let mut cache = ModuleSymbolCache::with_capacity(ObjectLoader, config.cache_capacity);
    let context = cache
        .ensure_loaded(exe)
        .with_context(|| format!("Failed to load symbols from {}", exe.display()))?;
    info!("Loaded {} symbols from {}", context.symbols().len(), exe.display());

    for offset in offsets {
        match context.resolve(offset) {
            Some(location) => writeln!(out, "{}", format_location(&location, None, config))?,
            None => writeln!(out, "{offset:x}")?,
        }
    }
    out.flush()?;
    Ok(())
}
