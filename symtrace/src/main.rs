//! # symtrace - Main Entry Point
//!
//! - `symtrace trace`: print this process's own stack to stderr (in-process path)
//! - `symtrace resolve --exe PATH OFFSET...`: resolve offsets inside a binary

use anyhow::Result;
use clap::Parser;
use log::debug;
use std::io;

use symtrace::cli::{resolve_offsets, Args, Command};
use symtrace::printer::StackPrinter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = err.to_string().to_lowercase();
    if msg.contains("invalid offset") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = args.config();
    debug!("Configuration: {config:?}");

    match args.command {
        Command::Trace { .. } => {
            // Traces are diagnostics, like `print_stack`
            let mut printer = StackPrinter::for_current_process(config);
            let stderr = io::stderr();
            printer.print(&mut stderr.lock())?;
        }
        Command::Resolve { ref exe, ref offsets } => {
            let stdout = io::stdout();
            resolve_offsets(exe, offsets, &config, &mut stdout.lock())?;
        }
    }
    Ok(())
}
