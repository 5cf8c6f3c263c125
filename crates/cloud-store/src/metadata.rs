//! REST client for the sketch metadata document store.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use sketchapp_core::errors::Result as CoreResult;
use sketchapp_core::remote::MetadataStore;
use sketchapp_core::sketch::SketchDocument;

use crate::error::{into_core_delete, into_core_query, into_core_upload, CloudStoreError, Result};
use crate::types::ApiErrorResponse;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Client for the sketch metadata document API.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderValue,
}

impl MetadataClient {
    /// Create a new metadata client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the document API
    /// * `auth_token` - Bearer token identifying the signed-in user
    pub fn new(base_url: &str, auth_token: &str) -> Result<Self> {
        if auth_token.trim().is_empty() {
            return Err(CloudStoreError::config("auth token must not be blank"));
        }
        let auth_header = HeaderValue::from_str(&format!("Bearer {}", auth_token))
            .map_err(|_| CloudStoreError::config("invalid auth token format"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, self.auth_header.clone());
        headers
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(Self::error_from_body(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|err| {
            log::error!(
                "Failed to deserialize response. Body: {}, Error: {}",
                body,
                err
            );
            CloudStoreError::api(status.as_u16(), format!("Failed to parse response: {}", err))
        })
    }

    /// Check a response where only the status matters.
    async fn expect_success(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            debug!("API response status: {}", status);
            return Ok(());
        }
        let body = response.text().await?;
        Self::log_response(status, &body);
        Err(Self::error_from_body(status.as_u16(), &body))
    }

    fn error_from_body(status: u16, body: &str) -> CloudStoreError {
        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(body) {
            return CloudStoreError::api(status, format!("{}: {}", error.code, error.message));
        }
        CloudStoreError::api(status, format!("Request failed: {}", body))
    }

    /// Upsert the document for one sketch.
    ///
    /// PUT /v1/sketches/{id}
    async fn set_document(&self, id: &str, doc: &SketchDocument) -> Result<()> {
        let url = format!("{}/v1/sketches/{}", self.base_url, id);
        let response = self
            .client
            .put(&url)
            .headers(self.headers())
            .json(doc)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    /// Delete the document for one sketch.
    ///
    /// DELETE /v1/sketches/{id}
    async fn delete_document(&self, id: &str) -> Result<()> {
        let url = format!("{}/v1/sketches/{}", self.base_url, id);
        let response = self
            .client
            .delete(&url)
            .headers(self.headers())
            .send()
            .await?;
        Self::expect_success(response).await
    }

    /// List every document owned by one user.
    ///
    /// GET /v1/sketches?ownerId={ownerId}
    async fn query_documents(&self, owner_id: &str) -> Result<Vec<SketchDocument>> {
        let url = format!("{}/v1/sketches", self.base_url);
        let response = self
            .client
            .get(&url)
            .headers(self.headers())
            .query(&[("ownerId", owner_id)])
            .send()
            .await?;
        Self::parse_response(response).await
    }
}

#[async_trait]
impl MetadataStore for MetadataClient {
    async fn set(&self, id: &str, doc: &SketchDocument) -> CoreResult<()> {
        self.set_document(id, doc).await.map_err(into_core_upload)
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.delete_document(id).await.map_err(into_core_delete)
    }

    async fn query(&self, owner_id: &str) -> CoreResult<Vec<SketchDocument>> {
        self.query_documents(owner_id)
            .await
            .map_err(into_core_query)
    }
}
