//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{TraceConfig, DEFAULT_MAX_FRAMES};

#[derive(Parser)]
#[command(
    name = "symtrace",
    about = "Resolve stack addresses to file:line function",
    after_help = "\
EXAMPLES:
    symtrace trace                           Print this process's own stack
    symtrace resolve --exe ./app 0x1a2b      Resolve an offset inside ./app
    symtrace resolve -e ./app --full-paths 1a2b 3c4d"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Print source paths in full instead of file names only
    #[arg(long, global = true)]
    pub full_paths: bool,

    /// Marker printed for unknown functions and files
    #[arg(long, global = true, value_name = "TEXT", default_value = "??")]
    pub unknown: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Capture and print the current stack of this process
    Trace {
        /// Maximum number of frames to capture
        #[arg(long, default_value_t = DEFAULT_MAX_FRAMES)]
        max_frames: usize,
    },
    /// Resolve module-relative offsets against one binary
    Resolve {
        /// Binary whose debug info is read
        #[arg(short, long, value_name = "PATH")]
        exe: PathBuf,

        /// Hexadecimal offsets, with or without 0x
        #[arg(value_name = "OFFSET", required = true)]
        offsets: Vec<String>,
    },
}

impl Args {
    /// Trace configuration described by these arguments
    #[must_use]
    pub fn config(&self) -> TraceConfig {
        let config = TraceConfig::default()
            .with_full_paths(self.full_paths)
            .with_unknown_symbol(self.unknown.clone());
        match self.command {
            Command::Trace { max_frames } => config.with_max_frames(max_frames),
            Command::Resolve { .. } => config,
        }
    }
}
