use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::errors::ServiceError;

/// Maximum accepted payment-proof size: 5 MiB.
pub const MAX_PROOF_BYTES: usize = 5 * 1024 * 1024;

/// Content types accepted for payment-proof images.
pub const ALLOWED_PROOF_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

/// External object storage. Implementations take a binary payload and return
/// the secure URL the stored object is reachable under.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bytes: Bytes,
        content_type: &str,
        folder: &str,
    ) -> Result<String, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// HTTP-backed object storage client.
#[derive(Clone)]
pub struct HttpObjectStorage {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpObjectStorage {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    #[instrument(skip(self, bytes), fields(size = bytes.len(), folder = %folder))]
    async fn upload(
        &self,
        bytes: Bytes,
        content_type: &str,
        folder: &str,
    ) -> Result<String, ServiceError> {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name("upload")
            .mime_str(content_type)
            .map_err(|e| ServiceError::ValidationError(format!("Invalid content type: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .text("folder", folder.to_string())
            .part("file", part);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Payment proof upload request failed");
                ServiceError::ExternalServiceError(format!("Storage upload failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Storage service rejected upload");
            return Err(ServiceError::ExternalServiceError(format!(
                "Storage upload failed with status {}",
                status
            )));
        }

        let parsed: UploadResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Storage service returned an unreadable response");
            ServiceError::ExternalServiceError(format!("Storage response unreadable: {}", e))
        })?;

        info!(url = %parsed.secure_url, "Payment proof uploaded");
        Ok(parsed.secure_url)
    }
}
