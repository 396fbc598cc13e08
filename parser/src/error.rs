//! FILENAME: parser/src/error.rs
//! PURPOSE: Per-formula errors for the lexing/parsing front end.
//! CONTEXT: Both kinds abort only the formula they occur in. Batch callers
//! record the failing formula and message, skip it, and keep going; one bad
//! formula never takes down the run.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// No lexical pattern matched at `offset` (byte offset into the raw
    /// formula text, marker included).
    #[error("unrecognized character at offset {offset}")]
    Lex { offset: usize },

    /// A grammar rule could not complete after backtracking was ruled out:
    /// unterminated quoted name, malformed argument list, missing closing
    /// parenthesis, missing operand.
    #[error("expected {expected} at offset {offset}")]
    Parse { offset: usize, expected: String },
}
