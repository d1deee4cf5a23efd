//! Error types for the pipeline agent.

use thiserror::Error;

use crate::registry::CollaboratorName;

/// Result type for pipeline-agent operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pipeline-agent operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No request text provided.
    #[error("no request text provided")]
    EmptyInput,

    /// A pipeline stage was requested before its prerequisite completed.
    #[error("cannot route to {collaborator}: no {missing} for this session yet (run {unblock} first)")]
    PrerequisiteMissing {
        collaborator: CollaboratorName,
        missing: &'static str,
        unblock: CollaboratorName,
    },

    /// Collaborator could not be reached. Transient, eligible for retry.
    #[error("collaborator {collaborator} unreachable: {message}")]
    CollaboratorUnavailable {
        collaborator: CollaboratorName,
        message: String,
    },

    /// Collaborator was reached but returned an application error.
    #[error("collaborator {collaborator} failed: {message}")]
    CollaboratorError {
        collaborator: CollaboratorName,
        message: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the retry wrapper should re-attempt after this error.
    ///
    /// Only unreachable-class failures qualify; prerequisite violations and
    /// application errors from a collaborator are terminal for the request.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::CollaboratorUnavailable { .. })
    }

    /// The collaborator this error originated from, if any.
    pub fn collaborator(&self) -> Option<CollaboratorName> {
        match self {
            Error::PrerequisiteMissing { collaborator, .. }
            | Error::CollaboratorUnavailable { collaborator, .. }
            | Error::CollaboratorError { collaborator, .. } => Some(*collaborator),
            _ => None,
        }
    }
}
