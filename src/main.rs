// File: src/main.rs
//
// Main entry point for the Quill interpreter.
// With a script argument the file is compiled and run; without one an
// interactive session starts. Exit codes: 64 usage, 65 compile error,
// 70 runtime error, 74 unreadable input file.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::error::ErrorKind;
use clap::Parser;

use quill::repl::Repl;
use quill::vm::Vm;

#[derive(Parser)]
#[command(
    name = "quill",
    about = "Quill: a small class-based scripting language",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    /// Script file to run; starts an interactive session when omitted
    script: Option<PathBuf>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return;
        }
        Err(_) => {
            eprintln!("Usage: quill [script]");
            process::exit(64);
        }
    };

    match cli.script {
        Some(path) => run_file(&path),
        None => run_repl(),
    }
}

fn run_file(path: &Path) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Could not read \"{}\": {}.", path.display(), err);
            process::exit(74);
        }
    };

    let mut vm = Vm::new();
    if let Err(error) = vm.interpret(&source) {
        process::exit(error.exit_code());
    }
}

fn run_repl() {
    match Repl::new() {
        Ok(mut repl) => {
            if let Err(err) = repl.run() {
                eprintln!("REPL error: {}", err);
                process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("Failed to start REPL: {}", err);
            process::exit(1);
        }
    }
}
