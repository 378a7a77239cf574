// File: src/repl.rs
//
// Interactive REPL for the Quill programming language.
// One line per evaluation against a persistent VM, with line editing and
// history. Interpreter errors are already printed by the VM, so the loop
// only owns the session plumbing.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::vm::Vm;

/// REPL session holding the VM state shared across inputs.
pub struct Repl {
    vm: Vm,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Repl { vm: Vm::new(), editor: DefaultEditor::new()? })
    }

    /// Run the read-eval-print loop until EOF.
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            match self.editor.readline("> ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line.as_str());
                    // Errors were printed; the session keeps going
                    let _ = self.vm.interpret(&line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C (Ctrl+D to exit)".bright_yellow());
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    eprintln!("{} {}", "Error:".bright_red(), err);
                    break;
                }
            }
        }
        Ok(())
    }
}
