//! Contracts for the remote tiers: the metadata document store and the
//! blob store.
//!
//! Implementations live outside the core; the engine only ever sees these
//! traits, so a backend proxy or a test fake can stand in for the real
//! services.

use async_trait::async_trait;

use crate::errors::Result;
use crate::sketch::SketchDocument;

/// Logical folder for raster images in the blob store.
pub const SKETCH_IMAGES_FOLDER: &str = "sketch_images";

/// Logical folder for serialized path blobs. Same object key as the image,
/// distinct namespace, so the two asset kinds cannot collide.
pub const SKETCH_PATHS_FOLDER: &str = "sketch_paths";

/// Result of an image upload: the stored key plus every derived URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub object_key: String,
    pub original_url: String,
    pub optimized_url: String,
    pub thumbnail_url: String,
}

/// Result of a raw (text) blob upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedRaw {
    pub object_key: String,
    pub secure_url: String,
}

/// Remote metadata document store, keyed by sketch ID.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Upsert the document stored under `id`.
    async fn set(&self, id: &str, doc: &SketchDocument) -> Result<()>;

    /// Delete the document stored under `id`.
    async fn delete(&self, id: &str) -> Result<()>;

    /// List every document owned by `owner_id`.
    async fn query(&self, owner_id: &str) -> Result<Vec<SketchDocument>>;
}

/// Remote blob store moving raster images and raw text assets.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload an image, overwriting any object already stored at
    /// `object_key`. Retries with the same key are safe.
    async fn upload_image(&self, local_path: &str, object_key: &str) -> Result<UploadedImage>;

    /// Upload a text asset under `folder`, namespaced away from images
    /// that share the same key.
    async fn upload_raw_file(
        &self,
        local_path: &str,
        object_key: &str,
        folder: &str,
    ) -> Result<UploadedRaw>;

    /// Fetch a raw text asset by URL.
    async fn download_raw_file(&self, url: &str) -> Result<String>;

    /// Best-effort removal of every asset stored under `object_key`.
    async fn delete_image(&self, object_key: &str) -> Result<()>;
}
