//! Tiny BASIC Interpreter
//!
//! A direct-execution interpreter for a minimal line-numbered BASIC dialect:
//! integer arithmetic, single-letter variables, `IF`/`GOTO` control flow by
//! line number, comments, and `PRINT` output. Statements are executed straight
//! off the token stream; there is no syntax tree and no compilation step, so
//! every jump re-scans the source from the beginning.

pub mod executor;
pub mod program;
pub mod tokenizer;
pub mod variables;

// Re-export core types for convenience
pub use crate::error::{InterpreterError, Result};
pub use executor::{ControlTransfer, Executor};
pub use program::LineIndex;
pub use tokenizer::{Token, Tokenizer};
pub use variables::VariableStore;

/// Core error handling types for the interpreter
pub mod error {
    use thiserror::Error;

    /// Result type for interpreter operations
    pub type Result<T> = std::result::Result<T, InterpreterError>;

    /// Fatal interpreter errors. Every variant aborts the run; the only
    /// non-fatal diagnostic in the language, the divide-by-zero warning, is
    /// reported on stderr and never surfaces here.
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum InterpreterError {
        /// A specific token was required and something else was found
        #[error("syntax error: unexpected `{found}`, expected `{expected}`")]
        UnexpectedToken { found: String, expected: String },

        /// Token that cannot start a factor (number, variable, or `(`)
        #[error("syntax error: unexpected `{0}` in expression")]
        UnexpectedFactor(String),

        /// Statement position held a token no statement starts with
        #[error("syntax error: unrecognized statement `{0}`")]
        UnrecognizedStatement(String),

        /// Assignment without a variable on the left-hand side
        #[error("syntax error: expected variable name, found `{0}`")]
        ExpectedVariable(String),

        /// Jump target absent from the line index
        #[error("runtime error: line number {0} not found")]
        UndefinedLine(i32),

        // Tokenizer errors
        #[error("syntax error: unexpected character `{0}`")]
        UnexpectedCharacter(char),
        #[error("syntax error: unknown keyword `{0}`")]
        UnknownKeyword(String),
        #[error("syntax error: unterminated string literal")]
        UnterminatedString,
        #[error("syntax error: numeric literal out of range")]
        NumberOutOfRange,

        /// Invariant violation, e.g. an indexed line the re-scan cannot reach
        #[error("internal error: {0}")]
        Internal(String),
    }
}
