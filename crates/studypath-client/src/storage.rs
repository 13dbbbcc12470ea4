//! Blob storage buckets on the hosted backend.

use std::time::Duration;

use serde::Serialize;
use tracing::instrument;

use studypath_core::error::BackendError;

use crate::config::BackendConfig;

/// HTTP client for the backend's storage routes.
#[derive(Clone)]
pub struct StorageClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

impl StorageClient {
    pub fn new(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
            timeout_secs: config.timeout_secs,
        }
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.base_url)
    }

    /// Upload a blob to a bucket.
    #[instrument(skip(self, bytes), fields(bucket = %bucket, path = %path, size = bytes.len()))]
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.object_url(bucket, path))
            .header("apikey", &self.api_key)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.check_status(response, bucket).await
    }

    /// Remove blobs from a bucket.
    #[instrument(skip(self), fields(bucket = %bucket, count = paths.len()))]
    pub async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(format!("{}/storage/v1/object/{bucket}", self.base_url))
            .header("apikey", &self.api_key)
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&RemoveRequest { prefixes: paths })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.check_status(response, bucket).await
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout_secs)
        } else {
            BackendError::Network(e.to_string())
        }
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
        bucket: &str,
    ) -> Result<(), BackendError> {
        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::AuthenticationFailed(body));
        }
        if status == 404 {
            return Err(BackendError::NotFound(bucket.to_string()));
        }
        if status >= 400 {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::ApiError { status, message });
        }
        Ok(())
    }
}
