//! Turning captured frames into `file:line function` lines
//!
//! Per frame: parse the text record, resolve the runtime address, demangle
//! the function name, then emit `<frame text> <file>:<line> <function>`.
//! Frames that cannot be resolved print as `<frame text> <hex address>`.
//! A failure on one frame never affects the others.

use log::{debug, warn};
use std::io::Write;

use crate::capture::{platform_capture, StackCapture};
use crate::config::TraceConfig;
use crate::demangle::demangle_or_keep;
use crate::domain::{Address, ResolvedLocation, StackFrame, SymbolizeError};
use crate::frame_parser::ParsedFrame;
use crate::symbolization::{platform_resolver, SymbolResolver};

/// Captures, resolves and prints call stacks
///
/// A printer owns its resolver, and with it the module cache, so repeated
/// traces reuse opened debug info. Printers are not shared between threads.
pub struct StackPrinter<R, C> {
    resolver: R,
    capture: C,
    config: TraceConfig,
}

impl StackPrinter<Box<dyn SymbolResolver>, Box<dyn StackCapture>> {
    /// Printer using this platform's capture and resolver
    #[must_use]
    pub fn for_current_process(config: TraceConfig) -> Self {
        let resolver = platform_resolver(&config);
        Self::new(resolver, platform_capture(), config)
    }
}

impl<R: SymbolResolver, C: StackCapture> StackPrinter<R, C> {
    pub fn new(resolver: R, capture: C, config: TraceConfig) -> Self {
        Self { resolver, capture, config }
    }

    #[must_use]
    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    #[must_use]
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Capture the current stack and print one line per frame
    ///
    /// Returns the number of frames printed.
    ///
    /// # Errors
    /// Returns [`SymbolizeError::CaptureFailed`] when no frames were captured
    /// and [`SymbolizeError::Io`] when writing to `out` fails
    pub fn print<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<usize, SymbolizeError> {
        let frames = self.capture.capture(self.config.max_frames)?;
        if frames.is_empty() {
            warn!("Stack capture returned no frames");
            return Err(SymbolizeError::CaptureFailed);
        }

        self.print_frames(&frames, out)?;
        Ok(frames.len())
    }

    /// Print already captured frames in order
    ///
    /// # Errors
    /// Returns [`SymbolizeError::Io`] when writing to `out` fails
    pub fn print_frames<W: Write + ?Sized>(
        &mut self,
        frames: &[StackFrame],
        out: &mut W,
    ) -> Result<(), SymbolizeError> {
        for frame in frames {
            let line = self.describe(frame);
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(())
    }

    /// Format one frame as it would be printed
    pub fn describe(&mut self, frame: &StackFrame) -> String {
        let text = frame.display_text();
        let parsed = frame.text.as_deref().map(ParsedFrame::parse);

        let addr = match parsed {
            Some(ref parsed) => match parsed.address_value() {
                Some(addr) => addr,
                None => {
                    debug!("No address in frame record {text:?}");
                    return raw_line(&text, frame.address);
                }
            },
            None => frame.address,
        };

        match self.resolver.resolve(addr) {
            Some(location) => {
                let mangled = parsed.as_ref().and_then(ParsedFrame::symbol);
                format!("{text} {}", format_location(&location, mangled, &self.config))
            }
            None => raw_line(&text, addr),
        }
    }
}

fn raw_line(text: &str, addr: Address) -> String {
    format!("{text} {addr:x}")
}

/// Format a resolved location as `<file>:<line> <function>`
///
/// The function name prefers the debug info over `fallback_name` (the name
/// from the frame record) and is demangled when possible. Unknown names and
/// files print as the configured marker.
#[must_use]
pub fn format_location(
    location: &ResolvedLocation,
    fallback_name: Option<&str>,
    config: &TraceConfig,
) -> String {
    let file = match location.file.as_deref() {
        Some(file) if config.full_paths => file,
        Some(file) => file_name(file),
        None => &config.unknown_symbol,
    };
    let line = location.source_line().map_or(0, |(_, line)| line);
    let function = location
        .function_name()
        .or(fallback_name.filter(|name| !name.is_empty()))
        .map_or_else(|| config.unknown_symbol.clone(), demangle_or_keep);

    format!("{file}:{line} {function}")
}

/// Final path component, accepting both separators
fn file_name(path: &str) -> &str {
    path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path)
}
