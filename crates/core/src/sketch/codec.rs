//! JSON codec for vector path lists.
//!
//! The whole list is serialized as a unit; a partial encoding is never
//! produced. Failures collapse to `None` so callers can degrade to an
//! image-only sketch instead of surfacing an error.

use log::error;

use super::path::DrawingPath;

/// Serialize a path list to its portable JSON encoding.
pub fn serialize_paths(paths: &[DrawingPath]) -> Option<String> {
    match serde_json::to_string(paths) {
        Ok(json) => Some(json),
        Err(err) => {
            error!("Failed to serialize {} drawing paths: {}", paths.len(), err);
            None
        }
    }
}

/// Deserialize a portable JSON encoding back into a path list.
///
/// Unrecognized fields are ignored so newer clients can extend the format
/// without breaking older ones.
pub fn deserialize_paths(json: &str) -> Option<Vec<DrawingPath>> {
    match serde_json::from_str(json) {
        Ok(paths) => Some(paths),
        Err(err) => {
            error!("Failed to deserialize drawing paths: {}", err);
            None
        }
    }
}
