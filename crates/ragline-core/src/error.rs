//! Error types for the ragline workspace.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire ragline workspace.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum RaglineError {
    /// The answering backend was unreachable.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The answering backend returned a failure status.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A dispatch was requested while another one is in flight.
    #[error("A dispatch is already in flight")]
    Busy,

    /// An edit was requested on a non-user or out-of-range message.
    #[error("Message at index {index} cannot be edited")]
    InvalidEditTarget { index: usize },

    /// A capability (e.g. speech capture) is not available on this platform.
    #[error("Unsupported: {message}")]
    Unsupported { message: String },

    /// The platform refused a permission (e.g. microphone access).
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Data access error (repository/storage layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RaglineError {
    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a Server error
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates an Unsupported error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Creates a PermissionDenied error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a Busy rejection
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }

    /// Check if this is an InvalidEditTarget rejection
    pub fn is_invalid_edit_target(&self) -> bool {
        matches!(self, Self::InvalidEditTarget { .. })
    }

    /// Check if this is an Unsupported error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Check if this is a PermissionDenied error
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Check if this error came from the answering backend.
    ///
    /// Backend failures are recovered locally by inserting a synthetic
    /// apology message; they are never fatal to the session.
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Server { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for RaglineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for RaglineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for RaglineError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for RaglineError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for RaglineError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Server {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => Self::Network {
                message: err.to_string(),
            },
        }
    }
}

/// A type alias for `Result<T, RaglineError>`.
pub type Result<T> = std::result::Result<T, RaglineError>;
