//! Two-phase synchronization engine.
//!
//! Phase one uploads pending local changes, phase two downloads and merges
//! remote changes. Upload-phase writes fully resolve (to `Synced` or back
//! to `PendingUpload`) before the download phase reads remote state, so a
//! just-uploaded sketch is never conflict-compared against its own stale
//! pre-upload snapshot.

use std::sync::Arc;

use chrono::{Duration, Utc};
use log::{debug, error, warn};

use crate::errors::{Error, Result};
use crate::remote::{BlobStore, MetadataStore, SKETCH_PATHS_FOLDER};
use crate::sketch::{serialize_paths, Sketch, SketchDocument, SyncStatus};
use crate::store::SketchStore;

/// `Syncing` rows whose clock is older than this are treated as orphaned
/// by a crashed upload attempt and become retry candidates.
pub const STALE_SYNCING_THRESHOLD_SECS: i64 = 600;

pub struct SyncEngine {
    store: Arc<dyn SketchStore>,
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
}

impl SyncEngine {
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

    /// Run one full sync pass for `owner_id`.
    ///
    /// Individual upload failures are contained to their sketch, which
    /// reverts to `PendingUpload` for the next pass. Only the local status
    /// query and the remote list call can fail the pass as a whole.
    pub async fn sync_sketches(&self, owner_id: &str) -> Result<()> {
        debug!("Starting sync for owner: {}", owner_id);

        let candidates = self.upload_candidates(owner_id).await?;
        debug!("Found {} sketches pending upload", candidates.len());

        // Uploads run sequentially; one sketch's partial failure never
        // interleaves with another's.
        for sketch in candidates {
            if let Err(err) = self.upload_sketch(&sketch).await {
                error!("Failed to upload sketch {}: {}", sketch.id, err);
                self.revert_to_pending(&sketch).await;
            }
        }

        self.download_remote_sketches(owner_id).await?;

        debug!("Sync completed for owner: {}", owner_id);
        Ok(())
    }

    /// Pending uploads plus `Syncing` rows stranded by a crash.
    async fn upload_candidates(&self, owner_id: &str) -> Result<Vec<Sketch>> {
        let mut candidates = self.store.get_by_status(SyncStatus::PendingUpload).await?;

        let stale_cutoff = Utc::now() - Duration::seconds(STALE_SYNCING_THRESHOLD_SECS);
        for sketch in self.store.get_by_status(SyncStatus::Syncing).await? {
            if sketch.updated_at < stale_cutoff {
                warn!(
                    "Sketch {} stuck in syncing since {}, retrying",
                    sketch.id, sketch.updated_at
                );
                candidates.push(sketch);
            }
        }

        candidates.retain(|sketch| sketch.owner_id == owner_id);
        Ok(candidates)
    }

    /// Upload one sketch: image, optional path blob, metadata document.
    async fn upload_sketch(&self, sketch: &Sketch) -> Result<()> {
        debug!("Uploading sketch: {}", sketch.id);

        // Durable transition so subscribers observe the in-flight state.
        let syncing = Sketch {
            sync_status: SyncStatus::Syncing,
            ..sketch.clone()
        };
        self.store.update(syncing).await?;

        let local_path = sketch.local_image_path.as_deref().ok_or_else(|| {
            Error::upload(format!("no local image path for sketch {}", sketch.id))
        })?;
        if tokio::fs::metadata(local_path).await.is_err() {
            return Err(Error::upload(format!(
                "local image file not found: {}",
                local_path
            )));
        }

        let object_key = sketch.object_key();
        let image = self.blobs.upload_image(local_path, &object_key).await?;
        debug!("Image uploaded for {}: {}", sketch.id, image.optimized_url);

        let remote_paths_url = self.upload_paths_blob(sketch, &object_key).await;

        let synced = Sketch {
            remote_image_url: Some(image.optimized_url),
            thumbnail_url: Some(image.thumbnail_url),
            remote_paths_url,
            sync_status: SyncStatus::Synced,
            ..sketch.clone()
        };
        self.metadata
            .set(&synced.id, &SketchDocument::from_sketch(&synced))
            .await?;
        self.store.update(synced).await?;

        debug!("Upload completed: {}", sketch.id);
        Ok(())
    }

    /// Serialize and upload the vector paths as a raw blob.
    ///
    /// Failures are non-fatal: the sketch still syncs with image-only
    /// content and a null vector pointer.
    async fn upload_paths_blob(&self, sketch: &Sketch, object_key: &str) -> Option<String> {
        let paths = sketch.drawing_paths.as_deref()?;
        let json = serialize_paths(paths)?;

        let temp_path = std::env::temp_dir().join(format!(
            "paths_{}.json",
            object_key.replace('/', "_")
        ));
        if let Err(err) = tokio::fs::write(&temp_path, &json).await {
            warn!("Failed to stage paths blob for {}: {}", sketch.id, err);
            return None;
        }

        let result = self
            .blobs
            .upload_raw_file(
                &temp_path.to_string_lossy(),
                object_key,
                SKETCH_PATHS_FOLDER,
            )
            .await;

        if let Err(err) = tokio::fs::remove_file(&temp_path).await {
            debug!(
                "Failed to remove temp paths file {}: {}",
                temp_path.display(),
                err
            );
        }

        match result {
            Ok(raw) => {
                debug!("Paths uploaded for {}: {}", sketch.id, raw.secure_url);
                Some(raw.secure_url)
            }
            Err(err) => {
                warn!(
                    "Failed to upload paths for {}, continuing with image only: {}",
                    sketch.id, err
                );
                None
            }
        }
    }

    /// Put a failed upload back into the retry queue. A sketch is never
    /// left in `Syncing` after its attempt resolves.
    async fn revert_to_pending(&self, sketch: &Sketch) {
        let reverted = Sketch {
            sync_status: SyncStatus::PendingUpload,
            ..sketch.clone()
        };
        if let Err(err) = self.store.update(reverted).await {
            error!("Failed to revert sketch {} to pending: {}", sketch.id, err);
        }
    }

    /// Merge remote documents into the local store.
    async fn download_remote_sketches(&self, owner_id: &str) -> Result<()> {
        let documents = self.metadata.query(owner_id).await?;
        debug!("Found {} remote sketches", documents.len());

        for doc in documents {
            match self.store.get_by_id(&doc.id).await? {
                None => {
                    debug!("Adopting remote sketch: {}", doc.id);
                    self.store.insert(doc.into_local_sketch()).await?;
                }
                Some(local) if local.sync_status == SyncStatus::Synced => {
                    if doc.updated_at > local.updated_at {
                        debug!("Remote sketch is newer, updating: {}", doc.id);
                        self.store.update(merge_remote_metadata(local, &doc)).await?;
                    }
                }
                // Pending local changes take precedence until uploaded.
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Apply a newer remote document onto a local record.
///
/// Touches metadata fields only; locally-owned raster content
/// (`local_image_path`) is never overwritten.
fn merge_remote_metadata(local: Sketch, doc: &SketchDocument) -> Sketch {
    // A changed vector pointer invalidates the cached paths; the next open
    // re-hydrates from the new blob.
    let drawing_paths = if local.remote_paths_url == doc.remote_paths_url {
        local.drawing_paths
    } else {
        None
    };
    Sketch {
        title: doc.title.clone(),
        updated_at: doc.updated_at,
        remote_image_url: doc.remote_image_url.clone(),
        thumbnail_url: doc.thumbnail_url.clone(),
        remote_paths_url: doc.remote_paths_url.clone(),
        width: doc.width,
        height: doc.height,
        drawing_paths,
        ..local
    }
}
