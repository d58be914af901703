//! Error types for bulk operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by a file-store gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GatewayError {
    /// Transport-level failure; the request may or may not have reached the store.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The store refused the request (permission denied, invalid name, ...).
    #[error("{message}")]
    Rejected { message: String },
}

impl GatewayError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Create a rejection from an I/O error with path context.
    pub fn io(path: impl std::fmt::Display, source: &std::io::Error) -> Self {
        let message = match source.kind() {
            std::io::ErrorKind::PermissionDenied => format!("Permission denied: {path}"),
            std::io::ErrorKind::NotFound => format!("Not found: {path}"),
            _ => format!("{path}: {source}"),
        };
        Self::Rejected { message }
    }
}

/// Error descriptor carried by an operation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BulkError {
    /// The user dismissed the confirmation prompt.
    #[error("Operation cancelled")]
    UserCancelled,

    /// Another bulk operation is already in flight.
    #[error("Another operation is in progress")]
    Busy,

    /// The selection was made in another directory than the one targeted.
    #[error("Selection belongs to {selected}, not {requested}")]
    DirectoryMismatch { selected: String, requested: String },

    /// Transport-level failure. Only retried by an explicit re-dispatch.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The store refused the operation; the message is shown verbatim.
    #[error("{message}")]
    RemoteRejection { message: String },
}

impl BulkError {
    /// Silent errors are never surfaced as failure notifications.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            Self::UserCancelled | Self::Busy | Self::DirectoryMismatch { .. }
        )
    }
}

impl From<GatewayError> for BulkError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network { message } => Self::Network { message },
            GatewayError::Rejected { message } => Self::RemoteRejection { message },
        }
    }
}
