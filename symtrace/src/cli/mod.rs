//! Command-line interface of the `symtrace` binary

mod args;
mod resolve;

pub use args::{Args, Command};
pub use resolve::{parse_offset, resolve_offsets};
