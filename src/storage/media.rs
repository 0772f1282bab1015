//! Media storage using Cloudflare R2
//!
//! Handles upload, delete, and URL generation for media files.
//! Files are served via R2 Custom Domain (CDN).

use aws_sdk_s3::Client as S3Client;

use crate::error::AppError;

/// Result of a successful blob upload
#[derive(Debug, Clone)]
pub struct StoredMedia {
    /// Public URL for the uploaded file
    pub url: String,
    /// Storage key, used for later removal
    pub key: String,
    /// Media duration in seconds, when the store can determine it
    /// (0.0 otherwise)
    pub duration_seconds: f64,
}

/// Blob-store capability
///
/// Metadata persistence must not proceed when `store` fails (fail
/// closed); a failed `remove` of a superseded asset is logged by the
/// caller, never propagated.
#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload a file under the given prefix
    ///
    /// # Arguments
    /// * `prefix` - Key prefix ("avatars", "covers", "videos", "thumbnails")
    /// * `id` - Unique identifier for the file
    /// * `data` - File contents
    /// * `content_type` - MIME type
    async fn store(
        &self,
        prefix: &str,
        id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredMedia, AppError>;

    /// Delete a file by key
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Media storage service backed by Cloudflare R2
pub struct R2MediaStorage {
    /// S3-compatible client for R2
    client: S3Client,
    /// Media bucket name
    bucket: String,
    /// Public URL base (Custom Domain)
    /// e.g., "https://media.example.com"
    public_url: String,
}

impl R2MediaStorage {
    /// Create new media storage client
    ///
    /// # Arguments
    /// * `config` - Storage configuration with R2 credentials
    ///
    /// # Errors
    /// Returns error if S3 client initialization fails
    pub async fn new(config: &crate::config::StorageConfig) -> Result<Self, AppError> {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        // R2 endpoint: https://{account_id}.r2.cloudflarestorage.com
        let endpoint = format!("https://{}.r2.cloudflarestorage.com", config.account_id);

        // Create credentials
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "clipstream-r2",
        );

        // Build S3 config for R2
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("auto"))
            .endpoint_url(&endpoint)
            .credentials_provider(credentials)
            .build();

        let client = S3Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            public_url: config.public_url.clone(),
        })
    }

    /// Get public URL for a storage key
    fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

/// Determine file extension from content type
fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        _ => "bin",
    }
}

#[async_trait::async_trait]
impl MediaStore for R2MediaStorage {
    async fn store(
        &self,
        prefix: &str,
        id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredMedia, AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        let key = format!("{}/{}.{}", prefix, id, extension_for(content_type));
        let size = data.len() as f64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control("public, max-age=31536000") // 1 year
            .send()
            .await
            .map_err(|e| AppError::Dependency(format!("R2 upload failed: {}", e)))?;

        crate::metrics::MEDIA_UPLOADS_TOTAL.inc();
        crate::metrics::MEDIA_BYTES_UPLOADED.inc_by(size);

        Ok(StoredMedia {
            url: self.get_public_url(&key),
            key,
            // TODO: probe video duration with ffprobe in the upload
            // pipeline; R2 itself cannot report it.
            duration_seconds: 0.0,
        })
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Dependency(format!("R2 delete failed: {}", e)))?;

        Ok(())
    }
}

/// Best-effort removal of a superseded asset.
///
/// Failure is logged, never propagated: the primary record write has
/// already succeeded and is not rolled back.
pub(crate) async fn remove_best_effort(store: &dyn MediaStore, key: &str) {
    if let Err(error) = store.remove(key).await {
        tracing::warn!(%error, key, "Best-effort asset cleanup failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for("video/mp4"), "mp4");
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("application/octet-stream"), "bin");
    }
}
