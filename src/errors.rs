// File: src/errors.rs
//
// Error types for the Quill interpreter.
// Compile errors carry the offending token's position; runtime errors
// carry the stack trace captured at the point of failure. Both render in
// the stable text format the CLI prints to stderr.

use std::fmt;

/// Where in the token stream a compile error was reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// At a concrete token; the lexeme is quoted in the message.
    At(String),
    /// At end of input.
    AtEnd,
    /// A scanner-produced error token; the message stands alone.
    Lexical,
}

#[derive(Debug, Clone)]
pub struct CompileError {
    pub line: usize,
    pub location: ErrorLocation,
    pub message: String,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.location {
            ErrorLocation::At(lexeme) => {
                write!(f, "[line {}] Error at '{}': {}", self.line, lexeme, self.message)
            }
            ErrorLocation::AtEnd => {
                write!(f, "[line {}] Error at end: {}", self.line, self.message)
            }
            ErrorLocation::Lexical => write!(f, "[line {}] Error: {}", self.line, self.message),
        }
    }
}

impl std::error::Error for CompileError {}

/// A trapped runtime failure. The trace lists frames innermost first,
/// one `[line N] in name()` entry per active call.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub message: String,
    pub trace: Vec<String>,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for line in &self.trace {
            write!(f, "\n{}", line)?;
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {}

/// Outcome of `Vm::interpret` when the program did not finish cleanly.
#[derive(Debug, Clone)]
pub enum InterpretError {
    Compile(Vec<CompileError>),
    Runtime(RuntimeError),
}

impl InterpretError {
    /// Process exit code for the CLI: 65 for compile errors, 70 for
    /// runtime errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            InterpretError::Compile(_) => 65,
            InterpretError::Runtime(_) => 70,
        }
    }
}

impl fmt::Display for InterpretError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InterpretError::Compile(errors) => {
                for (index, error) in errors.iter().enumerate() {
                    if index > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", error)?;
                }
                Ok(())
            }
            InterpretError::Runtime(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for InterpretError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_formats() {
        let at = CompileError {
            line: 3,
            location: ErrorLocation::At("=".to_string()),
            message: "Invalid assignment target.".to_string(),
        };
        assert_eq!(at.to_string(), "[line 3] Error at '=': Invalid assignment target.");

        let at_end = CompileError {
            line: 7,
            location: ErrorLocation::AtEnd,
            message: "Expect '}' after block.".to_string(),
        };
        assert_eq!(at_end.to_string(), "[line 7] Error at end: Expect '}' after block.");

        let lexical = CompileError {
            line: 1,
            location: ErrorLocation::Lexical,
            message: "Unexpected character.".to_string(),
        };
        assert_eq!(lexical.to_string(), "[line 1] Error: Unexpected character.");
    }

    #[test]
    fn runtime_error_includes_trace() {
        let error = RuntimeError {
            message: "Undefined variable 'x'.".to_string(),
            trace: vec!["[line 2] in inner()".to_string(), "[line 5] in script".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Undefined variable 'x'.\n[line 2] in inner()\n[line 5] in script"
        );
    }
}
