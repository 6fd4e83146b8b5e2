//! Error types shared by the engine and its stores

use thiserror::Error;

/// Errors surfaced by the typing engine and its collaborators
#[derive(Debug, Error)]
pub enum TypingError {
    /// Rejected at the call boundary (empty text, unsupported mode)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Cursor operation outside the valid bounds; state is left unchanged
    #[error("cursor {cursor} out of range for {operation} (length {len})")]
    OutOfRange {
        operation: &'static str,
        cursor: usize,
        len: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl TypingError {
    /// Contract violations by the caller, as opposed to persistence failures
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            TypingError::InvalidInput(_) | TypingError::OutOfRange { .. }
        )
    }
}

pub type Result<T, E = TypingError> = std::result::Result<T, E>;
