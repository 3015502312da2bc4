use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use woza_core::models::session::{Permission, Session};
use woza_core::validation::{Severity, ValidationError};

use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::WozaService;

/// Where an uploaded photo lives, plus the digest of what was uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRef {
    pub key: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Evidence photos in an S3-compatible bucket (MinIO in development).
#[derive(Clone)]
pub struct PhotoVault {
    s3: S3Client,
    bucket: String,
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

impl PhotoVault {
    pub fn new(s3: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            s3,
            bucket: bucket.into(),
        }
    }

    pub async fn from_config(config: &Config) -> Self {
        let region_provider =
            RegionProviderChain::default_provider().or_else(Region::new(config.s3_region.clone()));
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .force_path_style(true)
            .endpoint_url(&config.s3_endpoint)
            .build();

        Self::new(S3Client::from_conf(s3_config), config.s3_bucket.clone())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Creates the bucket on first use.
    pub async fn ensure_bucket(&self) -> Result<()> {
        if self.s3.head_bucket().bucket(&self.bucket).send().await.is_ok() {
            return Ok(());
        }

        tracing::info!(bucket = %self.bucket, "creating photo bucket");
        self.s3
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| ServiceError::Photo(format!("cannot create bucket '{}': {}", self.bucket, e)))?;
        Ok(())
    }

    pub async fn store(&self, bytes: Vec<u8>, content_type: &str) -> Result<PhotoRef> {
        let extension = extension_for(content_type).ok_or_else(|| unsupported_type(content_type))?;

        self.ensure_bucket().await?;

        let sha256 = sha256_hex(&bytes);
        let size_bytes = bytes.len();
        let key = format!("collections/{}.{}", Uuid::new_v4(), extension);

        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .metadata("sha256", sha256.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(bucket = %self.bucket, key = %key, error = ?e, "photo upload failed");
                ServiceError::Photo(format!("upload of '{}' failed: {}", key, e))
            })?;

        tracing::debug!(key = %key, size_bytes, "photo stored");
        Ok(PhotoRef {
            key,
            sha256,
            size_bytes,
        })
    }
}

fn unsupported_type(content_type: &str) -> ServiceError {
    ServiceError::Validation(vec![ValidationError {
        code: "PHO-001".to_string(),
        severity: Severity::Error,
        message: format!("Photos must be JPEG, PNG or WebP (got '{}')", content_type),
        field: Some("contentType".to_string()),
    }])
}

impl WozaService {
    /// Uploads evidence ahead of a submission; the returned key goes into
    /// the draft's `photo_refs`.
    pub async fn upload_photo(&self, session: &Session, bytes: Vec<u8>, content_type: &str) -> Result<PhotoRef> {
        session.require(Permission::SubmitCollection)?;

        if extension_for(content_type).is_none() {
            return Err(unsupported_type(content_type));
        }
        let vault = self.photos.as_ref().ok_or(ServiceError::PhotosDisabled)?;
        vault.store(bytes, content_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_image_types() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for(" IMAGE/PNG "), Some("png"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("application/pdf"), None);
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
