//! Error types for the `docchat-model` crate.

use thiserror::Error;

/// Errors produced by completion clients and the run poller.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The completion request or its stream failed.
    #[error("Completion error ({provider}): {message}")]
    Completion {
        /// The provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Missing or invalid client configuration (e.g. no API credential).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A role string received from a remote API is not one of system/user/assistant.
    #[error("Invalid role: '{0}'")]
    InvalidRole(String),

    /// A run status string received from a remote API is not recognized.
    #[error("Invalid run status: '{0}'")]
    InvalidStatus(String),

    /// A remote run reached a terminal state other than `completed`.
    #[error("Run '{run_id}' ended with status {status}")]
    RunFailed {
        /// The remote run identifier.
        run_id: String,
        /// The terminal status that was observed.
        status: String,
    },

    /// An operation exceeded its deadline.
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl ModelError {
    /// Shorthand for a [`ModelError::Completion`] error.
    pub fn completion(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Completion { provider: provider.into(), message: message.into() }
    }
}

/// A convenience result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
