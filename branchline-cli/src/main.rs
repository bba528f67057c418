//! Branchline CLI: compile, run, inspect and fingerprint dialogue programs.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Input/decode/compile error
//! - 3: Runtime fault

mod commands;
mod console;

use std::process;

use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "compile" => commands::compile(&args[2..]),
        "run" => commands::run(&args[2..]),
        "disassemble" => commands::disassemble(&args[2..]),
        "hash" => commands::hash(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            process::exit(0);
        }
        other => {
            eprintln!("error: unknown command '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

/// Log to stderr so dialogue output on stdout stays clean.
/// `RUST_LOG` overrides the default `warn` filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    eprintln!("Usage: branchline <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  compile <script.json> [-o output.brl]   Compile a script tree to a program");
    eprintln!("  run <input.brl>                         Play a program on the console");
    eprintln!("  disassemble <input.brl>                 List a program's instructions");
    eprintln!("  hash <input.brl>                        Print a program's blake3 fingerprint");
}
