//! # symtrace - In-process stack trace symbolization
//!
//! symtrace turns the raw return addresses of a captured call stack into
//! `file:line function` lines, for crash handlers and fault logs. It runs
//! inside the process being traced and reads the debug information of the
//! executable and its shared libraries directly.
//!
//! ## Pipeline
//!
//! ```text
//!  StackCapture ──▶ frame_parser ──▶ ModuleEnumerator ──▶ ModuleSymbolCache
//!  (raw frames)     (name/offset/     (owning module,      (opened binary,
//!                    address)          load base)           symbol table)
//!                                                                │
//!        output ◀── demangle ◀── line_resolver ◀─────────────────┘
//!                               (section, nearest line)
//! ```
//!
//! ## Module Structure
//!
//! - [`capture`]: platform stack capture (glibc `backtrace`, Windows
//!   `RtlCaptureStackBackTrace`)
//! - [`frame_parser`]: field extraction from `module(name+off) [addr]` records
//! - [`symbolization`]: module lookup, the per-module cache, line resolution
//!   and the [`symbolization::SymbolResolver`] implementations
//! - [`demangle`]: Rust and C++ demangling
//! - [`printer`]: [`printer::StackPrinter`], which drives the pipeline
//! - [`config`]: [`config::TraceConfig`]
//! - [`domain`]: addresses, frames, resolved locations and errors
//! - [`cli`]: the `symtrace` command line
//!
//! ## Typical Usage
//!
//! ```no_run
//! // Print the current stack to stderr
//! symtrace::print_stack();
//! ```
//!
//! Binaries need debug info (`debug = true`) for file and line output;
//! stripped binaries still print function names from their symbol tables.

pub mod capture;
pub mod cli;
pub mod config;
pub mod demangle;
pub mod domain;
pub mod frame_parser;
pub mod printer;
pub mod symbolization;

use log::warn;
use std::io::{self, Write};

use config::TraceConfig;
use printer::StackPrinter;

/// Print the calling thread's stack to standard error
pub fn print_stack() {
    print_stack_with(&TraceConfig::default());
}

/// Print the calling thread's stack to standard error with `config`
///
/// Failures are reported on standard error and never propagate.
pub fn print_stack_with(config: &TraceConfig) {
    let mut printer = StackPrinter::for_current_process(config.clone());
    let stderr = io::stderr();
    let mut out = stderr.lock();

    if let Err(e) = printer.print(&mut out) {
        warn!("Stack trace failed: {e}");
        let _ = writeln!(out, "{e}");
    }
}
