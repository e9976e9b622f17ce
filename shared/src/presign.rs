//! Presigned download links for knowledge base source documents.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client as S3Client;
use tracing::info;

use crate::locator::S3Location;
use crate::{Error, Result};

/// How long an issued link stays valid.
pub const PRESIGN_EXPIRY: Duration = Duration::from_secs(300);

/// Issues read-only, time-limited links to S3 objects.
#[async_trait]
pub trait Presigner: Send + Sync {
    async fn presign_get(&self, location: &S3Location) -> Result<String>;
}

/// Presigner backed by the S3 SDK's request signing.
pub struct S3Presigner {
    client: S3Client,
    expires_in: Duration,
}

impl S3Presigner {
    pub fn new(client: S3Client) -> Self {
        Self {
            client,
            expires_in: PRESIGN_EXPIRY,
        }
    }
}

#[async_trait]
impl Presigner for S3Presigner {
    async fn presign_get(&self, location: &S3Location) -> Result<String> {
        let presigning = PresigningConfig::expires_in(self.expires_in)
            .map_err(|e| Error::Internal(format!("Invalid presigning config: {}", e)))?;

        let request = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .response_content_disposition("inline")
            .presigned(presigning)
            .await
            .map_err(|e| Error::Aws(DisplayErrorContext(&e).to_string()))?;

        info!(bucket = %location.bucket, key = %location.key, "Issued presigned URL");

        Ok(request.uri().to_string())
    }
}

/// Parse `raw` and presign it. Locator errors are returned before any
/// call to the presigner.
pub async fn presigned_url(presigner: &dyn Presigner, raw: &str) -> Result<String> {
    if raw.trim().is_empty() {
        return Err(Error::Validation("Invalid S3 URI/URL".to_string()));
    }
    let location = S3Location::parse(raw)?;
    presigner.presign_get(&location).await
}
