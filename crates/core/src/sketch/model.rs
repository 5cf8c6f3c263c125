//! Sketch entity and its remote metadata document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::path::DrawingPath;

/// Sync lifecycle of a sketch record.
///
/// `PendingDownload` and `Conflict` are declared for forward compatibility;
/// the engine currently resolves concurrent edits with last-write-wins and
/// fetches remote content lazily, so neither is produced today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// In sync with the cloud.
    Synced,
    /// Created or edited locally, needs upload.
    PendingUpload,
    /// Exists in the cloud, needs download.
    PendingDownload,
    /// Upload in flight.
    Syncing,
    /// Concurrent local and remote edits detected.
    Conflict,
}

/// The central entity: one drawing, local-first.
///
/// `updated_at` is the last-write-wins clock; it is bumped on every local
/// or remote mutation. A `Synced` sketch has non-null remote URLs, except
/// legacy records created before vector sync existed, whose
/// `remote_paths_url` may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sketch {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    /// Raster file owned by this record; deleted with it.
    pub local_image_path: Option<String>,
    pub remote_image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Pointer to the serialized path list stored as a separate blob.
    pub remote_paths_url: Option<String>,
    pub sync_status: SyncStatus,
    pub width: u32,
    pub height: u32,
    /// Vector content for editing; hydrated lazily from
    /// `remote_paths_url` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawing_paths: Option<Vec<DrawingPath>>,
}

impl Sketch {
    /// Stable remote object key shared by the image and path blobs.
    pub fn object_key(&self) -> String {
        format!("{}/{}", self.owner_id, self.id)
    }
}

/// Remote metadata document. Mirrors [`Sketch`] minus the local-only
/// fields (`local_image_path`, `sync_status`, in-memory `drawing_paths`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchDocument {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    pub remote_image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub remote_paths_url: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl SketchDocument {
    /// Build the document written to the remote store for `sketch`.
    pub fn from_sketch(sketch: &Sketch) -> Self {
        Self {
            id: sketch.id.clone(),
            title: sketch.title.clone(),
            owner_id: sketch.owner_id.clone(),
            created_at: sketch.created_at,
            updated_at: sketch.updated_at,
            remote_image_url: sketch.remote_image_url.clone(),
            thumbnail_url: sketch.thumbnail_url.clone(),
            remote_paths_url: sketch.remote_paths_url.clone(),
            width: sketch.width,
            height: sketch.height,
        }
    }

    /// Materialize a local record for a document with no local copy yet.
    /// The raster stays remote; content is fetched lazily via URL.
    pub fn into_local_sketch(self) -> Sketch {
        Sketch {
            id: self.id,
            title: self.title,
            owner_id: self.owner_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            local_image_path: None,
            remote_image_url: self.remote_image_url,
            thumbnail_url: self.thumbnail_url,
            remote_paths_url: self.remote_paths_url,
            sync_status: SyncStatus::Synced,
            width: self.width,
            height: self.height,
            drawing_paths: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_sketch() -> Sketch {
        Sketch {
            id: "s1".to_string(),
            title: "Harbor at dusk".to_string(),
            owner_id: "u1".to_string(),
            created_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            updated_at: Utc.timestamp_millis_opt(1_700_000_060_000).unwrap(),
            local_image_path: Some("/data/sketches/s1.png".to_string()),
            remote_image_url: None,
            thumbnail_url: None,
            remote_paths_url: None,
            sync_status: SyncStatus::PendingUpload,
            width: 1080,
            height: 1920,
            drawing_paths: None,
        }
    }

    #[test]
    fn object_key_is_owner_slash_id() {
        assert_eq!(sample_sketch().object_key(), "u1/s1");
    }

    #[test]
    fn document_drops_local_only_fields() {
        let json =
            serde_json::to_string(&SketchDocument::from_sketch(&sample_sketch())).unwrap();
        assert!(!json.contains("localImagePath"));
        assert!(!json.contains("syncStatus"));
        assert!(json.contains("\"updatedAt\":1700000060000"));
    }

    #[test]
    fn adopted_document_starts_synced_without_local_file() {
        let doc = SketchDocument::from_sketch(&sample_sketch());
        let local = doc.into_local_sketch();
        assert_eq!(local.sync_status, SyncStatus::Synced);
        assert!(local.local_image_path.is_none());
        assert!(local.drawing_paths.is_none());
    }

    #[test]
    fn document_tolerates_missing_paths_pointer() {
        // Documents written before vector sync existed have no
        // remotePathsUrl field at all.
        let json = r#"{"id":"s9","title":"Legacy","ownerId":"u1",
            "createdAt":1700000000000,"updatedAt":1700000000000,
            "remoteImageUrl":"https://cdn.test/s9","thumbnailUrl":null,
            "width":800,"height":600}"#;
        let doc: SketchDocument = serde_json::from_str(json).expect("parse legacy document");
        assert!(doc.remote_paths_url.is_none());
    }
}
