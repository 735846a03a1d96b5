//! Structured error types for symtrace
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Every variant describes a local, recoverable condition: callers degrade to
//! raw-address output instead of aborting a trace.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SymbolizeError {
    #[error("No stack info was found")]
    CaptureFailed,

    #[error("Failed to open debug info in {path}: {source}")]
    Open { path: PathBuf, source: std::io::Error },

    #[error("Cannot get addresses from archive {0}")]
    Archive(PathBuf),

    #[error("Format does not match for {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("Debug info for {0} is unavailable (previous open failed)")]
    Unavailable(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SymbolizeError {
    /// Whether the error concerns opening a module's debug info
    #[must_use]
    pub fn is_open_failure(&self) -> bool {
        matches!(
            self,
            Self::Open { .. } | Self::Archive(_) | Self::UnsupportedFormat { .. } | Self::Unavailable(_)
        )
    }
}
