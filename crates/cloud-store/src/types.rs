//! Wire types for the remote APIs.

use serde::Deserialize;

/// Successful upload response body from the media API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub public_id: Option<String>,
    pub secure_url: String,
}

/// Error envelope used by the media API: `{"error":{"message":"..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MediaErrorResponse {
    pub error: MediaErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MediaErrorBody {
    pub message: String,
}

/// Error envelope used by the metadata API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub code: String,
    pub message: String,
}
