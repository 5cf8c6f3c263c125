//! Error types for the cloud store clients.

use thiserror::Error;

use sketchapp_core::errors::Error as CoreError;

/// Result type alias for cloud store operations.
pub type Result<T> = std::result::Result<T, CloudStoreError>;

/// Errors that can occur while talking to the remote tiers.
#[derive(Debug, Error)]
pub enum CloudStoreError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from the remote API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Upload was rejected or could not complete
    #[error("upload failed: {0}")]
    Upload(String),

    /// Connectivity loss or timeout
    #[error("network error: {0}")]
    Network(String),

    /// Deletion was rejected or could not complete
    #[error("delete failed: {0}")]
    Delete(String),

    /// Malformed credentials or endpoint configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CloudStoreError {
    /// Create an API error from status and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an upload error.
    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload(message.into())
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a delete error.
    pub fn delete(message: impl Into<String>) -> Self {
        Self::Delete(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True when the underlying transport indicates connectivity loss.
    pub fn is_connectivity(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    /// Wrap a transport failure per the upload contract: connectivity loss
    /// maps to `Network`, anything else to `Upload`.
    pub fn from_upload_transport(err: reqwest::Error) -> Self {
        if Self::is_connectivity(&err) {
            Self::Network(err.to_string())
        } else {
            Self::Upload(err.to_string())
        }
    }
}

fn message_indicates_connectivity(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("network") || lower.contains("timeout") || lower.contains("connect")
}

/// Map a client error into the core taxonomy for upload call sites.
pub(crate) fn into_core_upload(err: CloudStoreError) -> CoreError {
    match err {
        CloudStoreError::Network(message) => CoreError::Network(message),
        CloudStoreError::Http(err) if CloudStoreError::is_connectivity(&err) => {
            CoreError::Network(err.to_string())
        }
        CloudStoreError::Api { status, message } if message_indicates_connectivity(&message) => {
            CoreError::Network(format!("({}) {}", status, message))
        }
        CloudStoreError::Api { status, message } => {
            CoreError::Upload(format!("({}) {}", status, message))
        }
        other => CoreError::Upload(other.to_string()),
    }
}

/// Map a client error into the core taxonomy for download call sites:
/// everything is a connectivity problem from the caller's perspective.
pub(crate) fn into_core_network(err: CloudStoreError) -> CoreError {
    match err {
        CloudStoreError::Network(message) => CoreError::Network(message),
        other => CoreError::Network(other.to_string()),
    }
}

/// Map a client error into the core taxonomy for delete call sites.
pub(crate) fn into_core_delete(err: CloudStoreError) -> CoreError {
    match err {
        CloudStoreError::Network(message) => CoreError::Network(message),
        CloudStoreError::Http(err) if CloudStoreError::is_connectivity(&err) => {
            CoreError::Network(err.to_string())
        }
        other => CoreError::Delete(other.to_string()),
    }
}

/// Map a client error into the core taxonomy for listing call sites.
pub(crate) fn into_core_query(err: CloudStoreError) -> CoreError {
    match err {
        CloudStoreError::Network(message) => CoreError::Network(message),
        CloudStoreError::Http(err) if CloudStoreError::is_connectivity(&err) => {
            CoreError::Network(err.to_string())
        }
        other => CoreError::Unknown(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_with_connectivity_message_maps_to_network() {
        let err = CloudStoreError::api(499, "client network socket disconnected");
        assert!(matches!(into_core_upload(err), CoreError::Network(_)));
    }

    #[test]
    fn api_error_maps_to_upload_by_default() {
        let err = CloudStoreError::api(400, "bad public_id");
        assert!(matches!(into_core_upload(err), CoreError::Upload(_)));
    }

    #[test]
    fn download_failures_always_map_to_network() {
        let err = CloudStoreError::api(404, "not found");
        assert!(matches!(into_core_network(err), CoreError::Network(_)));
    }
}
