//! Error types for the core crate.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the sync engine and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// Connectivity loss or request timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The remote accepted the request shape but the operation failed.
    #[error("upload failed: {0}")]
    Upload(String),

    /// A remote deletion was rejected or could not complete.
    #[error("delete failed: {0}")]
    Delete(String),

    /// Malformed credentials or endpoint configuration. Raised at
    /// construction time, not at call time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Local durable store failure.
    #[error("store error: {0}")]
    Store(String),

    /// The requested sketch does not exist locally.
    #[error("sketch not found: {0}")]
    NotFound(String),

    /// Anything uncategorized.
    #[error("{0}")]
    Unknown(String),
}

impl Error {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create an upload error.
    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload(message.into())
    }

    /// Create a delete error.
    pub fn delete(message: impl Into<String>) -> Self {
        Self::Delete(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a local store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create an uncategorized error.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown(message.into())
    }

    /// True when the failure is a connectivity problem worth retrying once
    /// the network is back.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Short human-readable message for UI surfaces.
    ///
    /// Classifies by error kind plus well-known message substrings; the
    /// original kind and message stay available through `Display`.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        let lower = message.to_lowercase();

        if lower.contains("cancelled") {
            "Operation cancelled. Please try again.".to_string()
        } else if self.is_network() || lower.contains("network") || lower.contains("timeout") {
            "Network unavailable. Your sketches are saved locally and will sync later.".to_string()
        } else if lower.contains("no account") {
            "No account found. Sign in to sync your sketches.".to_string()
        } else if lower.contains("invalid") {
            "Something went wrong with the request. Please try again.".to_string()
        } else {
            message
        }
    }
}
