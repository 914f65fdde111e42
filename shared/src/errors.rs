//! Shared error types for the test harness

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Invalid server version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    #[error("Logging initialisation failed: {message}")]
    LoggingError { message: String },
}

impl SharedError {
    pub fn invalid_version(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

pub type SharedResult<T> = Result<T, SharedError>;
