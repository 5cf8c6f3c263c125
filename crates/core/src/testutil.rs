//! Shared in-memory fakes for the engine and service test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::{Error, Result};
use crate::remote::{BlobStore, MetadataStore, UploadedImage, UploadedRaw};
use crate::sketch::{Sketch, SketchDocument, SyncStatus};

pub fn sketch_fixture(id: &str, owner: &str, status: SyncStatus) -> Sketch {
    let now = Utc::now();
    Sketch {
        id: id.to_string(),
        title: format!("Sketch {}", id),
        owner_id: owner.to_string(),
        created_at: now,
        updated_at: now,
        local_image_path: None,
        remote_image_url: None,
        thumbnail_url: None,
        remote_paths_url: None,
        sync_status: status,
        width: 1080,
        height: 1920,
        drawing_paths: None,
    }
}

/// Write a real file into the OS temp dir so engine file checks pass.
pub fn temp_image_file(name: &str) -> String {
    let path = std::env::temp_dir().join(format!("sketch_test_{}_{}.png", name, uuid::Uuid::new_v4()));
    std::fs::write(&path, b"png-bytes").expect("write temp image");
    path.to_string_lossy().into_owned()
}

/// Metadata store fake: a document map with scriptable failures.
#[derive(Default)]
pub struct FakeMetadataStore {
    pub docs: Mutex<HashMap<String, SketchDocument>>,
    pub deletes: Mutex<Vec<String>>,
    pub fail_set: AtomicBool,
    pub fail_query: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl FakeMetadataStore {
    pub fn seed(&self, doc: SketchDocument) {
        self.docs.lock().unwrap().insert(doc.id.clone(), doc);
    }
}

#[async_trait]
impl MetadataStore for FakeMetadataStore {
    async fn set(&self, id: &str, doc: &SketchDocument) -> Result<()> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(Error::upload("metadata write rejected"));
        }
        self.docs.lock().unwrap().insert(id.to_string(), doc.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.deletes.lock().unwrap().push(id.to_string());
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::delete("metadata delete rejected"));
        }
        self.docs.lock().unwrap().remove(id);
        Ok(())
    }

    async fn query(&self, owner_id: &str) -> Result<Vec<SketchDocument>> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(Error::network("metadata listing unreachable"));
        }
        Ok(self
            .docs
            .lock()
            .unwrap()
            .values()
            .filter(|doc| doc.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

/// Blob store fake recording every call; URLs are derived from the object
/// key so assertions can predict them.
#[derive(Default)]
pub struct FakeBlobStore {
    pub image_uploads: Mutex<Vec<String>>,
    pub raw_uploads: Mutex<Vec<(String, String)>>,
    pub downloads: Mutex<Vec<String>>,
    pub deletes: Mutex<Vec<String>>,
    pub raw_bodies: Mutex<HashMap<String, String>>,
    pub fail_image_upload: AtomicBool,
    pub fail_raw_upload: AtomicBool,
    pub fail_download: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl FakeBlobStore {
    pub fn put_raw_body(&self, url: &str, content: &str) {
        self.raw_bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), content.to_string());
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn upload_image(&self, _local_path: &str, object_key: &str) -> Result<UploadedImage> {
        if self.fail_image_upload.load(Ordering::SeqCst) {
            return Err(Error::upload("image upload rejected"));
        }
        self.image_uploads.lock().unwrap().push(object_key.to_string());
        Ok(UploadedImage {
            object_key: object_key.to_string(),
            original_url: format!("https://blobs.test/image/{}", object_key),
            optimized_url: format!("https://blobs.test/image/opt/{}", object_key),
            thumbnail_url: format!("https://blobs.test/image/thumb/{}", object_key),
        })
    }

    async fn upload_raw_file(
        &self,
        _local_path: &str,
        object_key: &str,
        folder: &str,
    ) -> Result<UploadedRaw> {
        if self.fail_raw_upload.load(Ordering::SeqCst) {
            return Err(Error::upload("raw upload rejected"));
        }
        self.raw_uploads
            .lock()
            .unwrap()
            .push((object_key.to_string(), folder.to_string()));
        Ok(UploadedRaw {
            object_key: object_key.to_string(),
            secure_url: format!("https://blobs.test/raw/{}/{}", folder, object_key),
        })
    }

    async fn download_raw_file(&self, url: &str) -> Result<String> {
        if self.fail_download.load(Ordering::SeqCst) {
            return Err(Error::network("blob download unreachable"));
        }
        self.downloads.lock().unwrap().push(url.to_string());
        self.raw_bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::network(format!("no blob at {}", url)))
    }

    async fn delete_image(&self, object_key: &str) -> Result<()> {
        self.deletes.lock().unwrap().push(object_key.to_string());
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::delete("blob delete rejected"));
        }
        Ok(())
    }
}
