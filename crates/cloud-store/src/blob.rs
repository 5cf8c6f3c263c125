//! Blob storage client for the media CDN.
//!
//! Moves raster images and raw text assets, and derives transformation
//! URLs without a network round trip. Privileged deletes are signed with
//! the account secret, which never leaves this module; routing deletes
//! through a backend proxy only requires another `BlobStore`
//! implementation.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::multipart;

use sketchapp_core::errors::Result as CoreResult;
use sketchapp_core::remote::{
    BlobStore, UploadedImage, UploadedRaw, SKETCH_IMAGES_FOLDER, SKETCH_PATHS_FOLDER,
};

use crate::crypto::sign_request;
use crate::error::{into_core_delete, into_core_network, into_core_upload, CloudStoreError, Result};
use crate::types::{MediaErrorResponse, UploadResponse};

/// Request timeout; bounds the sync pipeline when the CDN stalls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Default edge length for derived thumbnails.
const THUMBNAIL_SIZE: u32 = 200;

const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com";

/// Media store credentials. Validated once at construction; a malformed
/// config fails fast instead of at call time.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Use HTTPS for delivery URLs.
    pub secure: bool,
    api_base_url: String,
}

impl CloudinaryConfig {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Result<Self> {
        let config = Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            secure: true,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        };
        for (field, value) in [
            ("cloud_name", &config.cloud_name),
            ("api_key", &config.api_key),
            ("api_secret", &config.api_secret),
        ] {
            if value.trim().is_empty() {
                return Err(CloudStoreError::config(format!(
                    "{} must not be blank",
                    field
                )));
            }
        }
        Ok(config)
    }

    /// Point the upload/admin API at a different host.
    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.api_base_url = url.trim_end_matches('/').to_string();
        self
    }
}

/// Client for the media CDN. Holds no mutable state beyond the lazily
/// built HTTP handle.
pub struct CloudinaryClient {
    config: CloudinaryConfig,
    http: OnceLock<reqwest::Client>,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            http: OnceLock::new(),
        }
    }

    fn http(&self) -> &reqwest::Client {
        self.http.get_or_init(|| {
            reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client")
        })
    }

    fn scheme(&self) -> &'static str {
        if self.config.secure {
            "https"
        } else {
            "http"
        }
    }

    fn api_base(&self) -> String {
        format!(
            "{}/v1_1/{}",
            self.config.api_base_url, self.config.cloud_name
        )
    }

    /// Thumbnail URL for `object_key`; a pure template transform, no
    /// network call.
    pub fn generate_thumbnail_url(&self, object_key: &str, width: u32, height: u32) -> String {
        format!(
            "{}://res.cloudinary.com/{}/image/upload/w_{},h_{},c_fill,g_auto,f_auto,q_auto/{}",
            self.scheme(),
            self.config.cloud_name,
            width,
            height,
            object_key
        )
    }

    /// Auto-format/auto-quality delivery URL for `object_key`.
    pub fn generate_optimized_url(&self, object_key: &str) -> String {
        format!(
            "{}://res.cloudinary.com/{}/image/upload/f_auto,q_auto/{}",
            self.scheme(),
            self.config.cloud_name,
            object_key
        )
    }

    /// Signed multipart upload shared by the image and raw paths.
    async fn upload_multipart(
        &self,
        local_path: &str,
        object_key: &str,
        folder: &str,
        resource_type: &str,
    ) -> Result<UploadResponse> {
        let bytes = tokio::fs::read(local_path).await.map_err(|err| {
            CloudStoreError::upload(format!("failed to read {}: {}", local_path, err))
        })?;

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_request(
            &[
                ("folder", folder),
                ("overwrite", "true"),
                ("public_id", object_key),
                ("timestamp", &timestamp),
            ],
            &self.config.api_secret,
        );

        let file_name = std::path::Path::new(local_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(file_name))
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("public_id", object_key.to_string())
            .text("folder", folder.to_string())
            .text("overwrite", "true");

        let url = format!("{}/{}/upload", self.api_base(), resource_type);
        debug!(
            "Uploading {} under {}: {}",
            resource_type, folder, object_key
        );

        let response = self
            .http()
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(CloudStoreError::from_upload_transport)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(CloudStoreError::from_upload_transport)?;
        if !status.is_success() {
            if let Ok(media_err) = serde_json::from_str::<MediaErrorResponse>(&body) {
                return Err(CloudStoreError::api(status.as_u16(), media_err.error.message));
            }
            return Err(CloudStoreError::api(
                status.as_u16(),
                format!("upload failed: {}", body),
            ));
        }
        serde_json::from_str(&body).map_err(|err| {
            CloudStoreError::upload(format!("failed to parse upload response: {}", err))
        })
    }

    /// Signed `destroy` call for one object.
    async fn destroy(&self, public_id: &str, resource_type: &str) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_request(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let body = format!(
            "public_id={}&timestamp={}&api_key={}&signature={}",
            urlencoding::encode(public_id),
            timestamp,
            urlencoding::encode(&self.config.api_key),
            signature
        );

        let url = format!("{}/{}/destroy", self.api_base(), resource_type);
        let response = self
            .http()
            .post(&url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await
            .map_err(|err| CloudStoreError::delete(format!("destroy request failed: {}", err)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(CloudStoreError::delete(format!(
                "destroy failed: HTTP {} - {}",
                status.as_u16(),
                body
            )))
        }
    }
}

#[async_trait]
impl BlobStore for CloudinaryClient {
    async fn upload_image(&self, local_path: &str, object_key: &str) -> CoreResult<UploadedImage> {
        let response = self
            .upload_multipart(local_path, object_key, SKETCH_IMAGES_FOLDER, "image")
            .await
            .map_err(into_core_upload)?;

        let public_id = response.public_id.unwrap_or_else(|| object_key.to_string());
        Ok(UploadedImage {
            original_url: response.secure_url,
            optimized_url: self.generate_optimized_url(&public_id),
            thumbnail_url: self.generate_thumbnail_url(&public_id, THUMBNAIL_SIZE, THUMBNAIL_SIZE),
            object_key: public_id,
        })
    }

    async fn upload_raw_file(
        &self,
        local_path: &str,
        object_key: &str,
        folder: &str,
    ) -> CoreResult<UploadedRaw> {
        let response = self
            .upload_multipart(local_path, object_key, folder, "raw")
            .await
            .map_err(into_core_upload)?;

        Ok(UploadedRaw {
            object_key: response.public_id.unwrap_or_else(|| object_key.to_string()),
            secure_url: response.secure_url,
        })
    }

    async fn download_raw_file(&self, url: &str) -> CoreResult<String> {
        debug!("Downloading raw file: {}", url);
        let response = self
            .http()
            .get(url)
            .send()
            .await
            .map_err(|err| into_core_network(CloudStoreError::network(err.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(into_core_network(CloudStoreError::network(format!(
                "download failed: HTTP {}",
                status.as_u16()
            ))));
        }
        response
            .text()
            .await
            .map_err(|err| into_core_network(CloudStoreError::network(err.to_string())))
    }

    /// Remove the image and its companion path blob under `object_key`.
    /// Both objects are attempted; only the image result decides the
    /// outcome, since the path blob may not exist for older sketches.
    async fn delete_image(&self, object_key: &str) -> CoreResult<()> {
        let image_id = format!("{}/{}", SKETCH_IMAGES_FOLDER, object_key);
        let image_result = self.destroy(&image_id, "image").await;
        match &image_result {
            Ok(()) => debug!("Deleted image: {}", image_id),
            Err(err) => warn!("Failed to delete image {}: {}", image_id, err),
        }

        let paths_id = format!("{}/{}", SKETCH_PATHS_FOLDER, object_key);
        match self.destroy(&paths_id, "raw").await {
            Ok(()) => debug!("Deleted paths blob: {}", paths_id),
            Err(err) => warn!(
                "Failed to delete paths blob (may not exist): {}: {}",
                paths_id, err
            ),
        }

        image_result.map_err(into_core_delete)
    }
}
