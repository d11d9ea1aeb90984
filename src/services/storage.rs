//! Object storage client
//!
//! Uploads order artwork to a Supabase-style storage HTTP API. Objects
//! land in a single configured bucket; callers pass bucket-relative
//! paths and the stored locator is that same path.

use reqwest::Client;

#[derive(Clone)]
pub struct StorageService {
    client: Client,
    service_key: String,
    base_url: String,
    bucket: String,
}

/// Error types for storage uploads
#[derive(Debug)]
pub enum StorageError {
    RequestError(String),
    ApiError { status: u16, message: String },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::RequestError(msg) => write!(f, "Request error: {}", msg),
            StorageError::ApiError { status, message } => {
                write!(f, "Storage API error {}: {}", status, message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl StorageService {
    pub fn new(service_key: String, base_url: String, bucket: String) -> Self {
        Self {
            client: Client::new(),
            service_key,
            base_url,
            bucket,
        }
    }

    /// Uploads a file under the given bucket-relative path. Upload is
    /// not idempotent; re-using a path fails with a conflict from the
    /// storage API.
    pub async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StorageError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::ApiError { status, message });
        }

        Ok(())
    }
}
