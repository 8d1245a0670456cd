//! Error types for exam-core.

use thiserror::Error;

/// Result type alias using ParseError.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while parsing AI generation output.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response is empty")]
    EmptyResponse,

    #[error("no JSON array found in response")]
    NoJsonFound,

    #[error("candidate {index}: {reason}")]
    Candidate { index: usize, reason: String },
}

impl ParseError {
    /// Shorthand for a per-candidate structure error.
    pub fn candidate(index: usize, reason: impl Into<String>) -> Self {
        Self::Candidate {
            index,
            reason: reason.into(),
        }
    }
}
