//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while compiling or rendering formulas
#[derive(Debug, Error)]
pub enum FormulaError {
    /// Formula source text could not be compiled to tokens
    #[error("Parse error: {0}")]
    Parse(String),

    /// A postfix token stream is not a well-formed expression
    ///
    /// Raised when the stream is empty, an operator finds fewer operands
    /// on the stack than its arity, or more than one value remains after
    /// the final token.
    #[error("Malformed formula: {0}")]
    Malformed(String),

    /// Reference to an invalid cell or range
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}
