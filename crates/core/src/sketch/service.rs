//! User-facing sketch operations: CRUD, lazy vector hydration, and
//! multi-backend deletion.
//!
//! Reads always come from the local store; writes land there first and the
//! sync engine reconciles them with the remote tiers in the background.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use tokio::sync::watch;
use uuid::Uuid;

use crate::errors::Result;
use crate::remote::{BlobStore, MetadataStore};
use crate::sketch::{deserialize_paths, DrawingPath, Sketch, SyncStatus};
use crate::store::SketchStore;

/// Parameters for creating a sketch from the canvas layer.
#[derive(Debug, Clone)]
pub struct NewSketch {
    pub title: String,
    pub owner_id: String,
    pub local_image_path: Option<String>,
    pub width: u32,
    pub height: u32,
    pub drawing_paths: Option<Vec<DrawingPath>>,
}

pub struct SketchService {
    store: Arc<dyn SketchStore>,
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
}

impl SketchService {
    pub fn new(
        store: Arc<dyn SketchStore>,
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            store,
            metadata,
            blobs,
        }
    }

    /// Create a sketch locally. It enters the sync pipeline as
    /// `PendingUpload`; the next sync pass uploads it.
    pub async fn create_sketch(&self, new: NewSketch) -> Result<Sketch> {
        let now = Utc::now();
        let sketch = Sketch {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            owner_id: new.owner_id,
            created_at: now,
            updated_at: now,
            local_image_path: new.local_image_path,
            remote_image_url: None,
            thumbnail_url: None,
            remote_paths_url: None,
            sync_status: SyncStatus::PendingUpload,
            width: new.width,
            height: new.height,
            drawing_paths: new.drawing_paths,
        };
        self.store.insert(sketch.clone()).await?;
        debug!("Sketch created locally: {}", sketch.id);
        Ok(sketch)
    }

    /// Persist a local edit. The record re-enters `PendingUpload` and its
    /// conflict clock is bumped.
    pub async fn update_sketch(&self, sketch: Sketch) -> Result<Sketch> {
        let updated = Sketch {
            sync_status: SyncStatus::PendingUpload,
            updated_at: Utc::now(),
            ..sketch
        };
        self.store.update(updated.clone()).await?;
        debug!("Sketch updated locally: {}", updated.id);
        Ok(updated)
    }

    /// Watch the owner's sketch list, newest first.
    pub fn subscribe(&self, owner_id: &str) -> watch::Receiver<Vec<Sketch>> {
        self.store.subscribe(owner_id)
    }

    /// Fetch one sketch, hydrating vector paths from the remote pointer
    /// when they are not cached yet.
    ///
    /// Hydration failures degrade to an image-only sketch; the caller can
    /// still view it even when editing is temporarily unavailable.
    pub async fn get_sketch(&self, id: &str) -> Result<Option<Sketch>> {
        let Some(sketch) = self.store.get_by_id(id).await? else {
            return Ok(None);
        };
        if sketch.drawing_paths.is_some() {
            return Ok(Some(sketch));
        }
        let Some(url) = sketch.remote_paths_url.clone() else {
            // Legacy record from before vector sync existed.
            return Ok(Some(sketch));
        };

        debug!("Downloading paths for sketch {} from {}", sketch.id, url);
        let content = match self.blobs.download_raw_file(&url).await {
            Ok(content) => content,
            Err(err) => {
                warn!("Failed to download paths for sketch {}: {}", sketch.id, err);
                return Ok(Some(sketch));
            }
        };
        let Some(paths) = deserialize_paths(&content) else {
            warn!("Failed to deserialize downloaded paths for sketch {}", sketch.id);
            return Ok(Some(sketch));
        };

        let hydrated = Sketch {
            drawing_paths: Some(paths),
            ..sketch
        };
        // Cache for offline access; serve the hydrated copy even if the
        // cache write fails.
        if let Err(err) = self.store.update(hydrated.clone()).await {
            warn!("Failed to cache paths for sketch {}: {}", hydrated.id, err);
        }
        Ok(Some(hydrated))
    }

    /// Remove a sketch from every tier it may exist in.
    ///
    /// Succeeds as soon as the local record is gone; remote failures are
    /// logged and swallowed. An orphaned remote object is acceptable,
    /// orphaned local metadata is not.
    pub async fn delete_sketch(&self, id: &str) -> Result<()> {
        let Some(sketch) = self.store.get_by_id(id).await? else {
            return Ok(());
        };

        if let Some(path) = sketch.local_image_path.as_deref() {
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!("Deleted local image: {}", path),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => warn!("Failed to delete local image {}: {}", path, err),
            }
        }

        // The authoritative "sketch no longer exists" signal. The only
        // step allowed to fail the operation.
        self.store.delete_by_id(id).await?;
        debug!("Sketch deleted locally: {}", id);

        if let Err(err) = self.metadata.delete(id).await {
            warn!("Failed to delete remote metadata for {}: {}", id, err);
        }

        if sketch.remote_image_url.is_some() || sketch.remote_paths_url.is_some() {
            let key = sketch.object_key();
            if let Err(err) = self.blobs.delete_image(&key).await {
                warn!("Failed to delete remote blobs for {}: {}", key, err);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySketchStore;
    use crate::testutil::{sketch_fixture, FakeBlobStore, FakeMetadataStore};

    fn service() -> (
        SketchService,
        Arc<MemorySketchStore>,
        Arc<FakeMetadataStore>,
        Arc<FakeBlobStore>,
    ) {
        let store = Arc::new(MemorySketchStore::new());
        let metadata = Arc::new(FakeMetadataStore::default());
        let blobs = Arc::new(FakeBlobStore::default());
        let service = SketchService::new(store.clone(), metadata.clone(), blobs.clone());
        (service, store, metadata, blobs)
    }

    #[tokio::test]
    async fn create_assigns_id_and_enters_pending_upload() {
        let (service, store, _, _) = service();
        let created = service
            .create_sketch(NewSketch {
                title: "First".to_string(),
                owner_id: "u1".to_string(),
                local_image_path: Some("/tmp/first.png".to_string()),
                width: 640,
                height: 480,
                drawing_paths: None,
            })
            .await
            .unwrap();

        assert!(!created.id.is_empty());
        assert_eq!(created.sync_status, SyncStatus::PendingUpload);
        assert_eq!(created.created_at, created.updated_at);
        assert!(store.get_by_id(&created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rename_re_enters_pending_upload_and_bumps_clock() {
        let (service, store, _, _) = service();
        let mut synced = sketch_fixture("s1", "u1", SyncStatus::Synced);
        synced.remote_image_url = Some("https://cdn.test/u1/s1".to_string());
        store.insert(synced.clone()).await.unwrap();

        let mut renamed = synced.clone();
        renamed.title = "Renamed".to_string();
        let updated = service.update_sketch(renamed).await.unwrap();

        assert_eq!(updated.sync_status, SyncStatus::PendingUpload);
        assert!(updated.updated_at > synced.updated_at);
        assert_eq!(
            store.get_by_id("s1").await.unwrap().unwrap().title,
            "Renamed"
        );
    }

    #[tokio::test]
    async fn get_sketch_without_pointer_degrades_gracefully() {
        let (service, store, _, blobs) = service();
        store
            .insert(sketch_fixture("legacy", "u1", SyncStatus::Synced))
            .await
            .unwrap();

        let fetched = service.get_sketch("legacy").await.unwrap().unwrap();
        assert!(fetched.drawing_paths.is_none());
        assert!(blobs.downloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_sketch_hydrates_and_caches_remote_paths() {
        let (service, store, _, blobs) = service();
        let mut sketch = sketch_fixture("s1", "u1", SyncStatus::Synced);
        sketch.remote_paths_url = Some("https://blobs.test/raw/sketch_paths/u1/s1".to_string());
        store.insert(sketch).await.unwrap();
        blobs.put_raw_body(
            "https://blobs.test/raw/sketch_paths/u1/s1",
            r#"[{"points":[{"x":1.0,"y":2.0}],"brush":"pen","color":0,"strokeWidth":2.0,"opacity":1.0}]"#,
        );

        let first = service.get_sketch("s1").await.unwrap().unwrap();
        assert_eq!(first.drawing_paths.as_ref().unwrap().len(), 1);

        // Second open is served from the cache; no second download.
        let second = service.get_sketch("s1").await.unwrap().unwrap();
        assert_eq!(second.drawing_paths.as_ref().unwrap().len(), 1);
        assert_eq!(blobs.downloads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_sketch_survives_download_failure() {
        let (service, store, _, blobs) = service();
        let mut sketch = sketch_fixture("s1", "u1", SyncStatus::Synced);
        sketch.remote_paths_url = Some("https://blobs.test/raw/sketch_paths/u1/s1".to_string());
        store.insert(sketch).await.unwrap();
        blobs.fail_download.store(true, std::sync::atomic::Ordering::SeqCst);

        let fetched = service.get_sketch("s1").await.unwrap().unwrap();
        assert!(fetched.drawing_paths.is_none());
    }

    #[tokio::test]
    async fn get_sketch_survives_malformed_remote_paths() {
        let (service, store, _, blobs) = service();
        let mut sketch = sketch_fixture("s1", "u1", SyncStatus::Synced);
        sketch.remote_paths_url = Some("https://blobs.test/raw/sketch_paths/u1/s1".to_string());
        store.insert(sketch).await.unwrap();
        blobs.put_raw_body("https://blobs.test/raw/sketch_paths/u1/s1", "{ not json");

        let fetched = service.get_sketch("s1").await.unwrap().unwrap();
        assert!(fetched.drawing_paths.is_none());
        // The bad payload is not cached; nothing was written back.
        assert!(store
            .get_by_id("s1")
            .await
            .unwrap()
            .unwrap()
            .drawing_paths
            .is_none());
    }

    #[tokio::test]
    async fn delete_succeeds_when_every_remote_tier_fails() {
        let (service, store, metadata, blobs) = service();
        let mut sketch = sketch_fixture("s1", "u1", SyncStatus::Synced);
        sketch.remote_image_url = Some("https://cdn.test/u1/s1".to_string());
        sketch.remote_paths_url = Some("https://cdn.test/raw/u1/s1".to_string());
        store.insert(sketch).await.unwrap();

        metadata
            .fail_delete
            .store(true, std::sync::atomic::Ordering::SeqCst);
        blobs
            .fail_delete
            .store(true, std::sync::atomic::Ordering::SeqCst);

        service.delete_sketch("s1").await.unwrap();
        assert!(store.get_by_id("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_skips_blob_tier_for_local_only_sketches() {
        let (service, store, _, blobs) = service();
        store
            .insert(sketch_fixture("draft", "u1", SyncStatus::PendingUpload))
            .await
            .unwrap();

        service.delete_sketch("draft").await.unwrap();
        assert!(blobs.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_of_unknown_id_is_a_no_op() {
        let (service, _, metadata, blobs) = service();
        service.delete_sketch("missing").await.unwrap();
        assert!(metadata.deletes.lock().unwrap().is_empty());
        assert!(blobs.deletes.lock().unwrap().is_empty());
    }
}
