/// Media storage collaborator
///
/// Accepts image payloads and returns stable URLs; deletion is invoked
/// best-effort by the interaction flows and never fails them.
use crate::error::{AppError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use s3_utils::S3Operations;

#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    /// Store an image and return its public URL
    async fn upload_image(&self, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<String>;

    /// Remove a previously stored image by URL
    async fn delete_image(&self, url: &str) -> anyhow::Result<()>;

    fn is_enabled(&self) -> bool {
        true
    }
}

/// S3-backed media store
pub struct S3MediaStore {
    ops: S3Operations,
}

impl S3MediaStore {
    pub fn new(ops: S3Operations) -> Self {
        Self { ops }
    }
}

#[async_trait::async_trait]
impl MediaStore for S3MediaStore {
    async fn upload_image(&self, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<String> {
        let key = self.ops.config().new_image_key(content_type);
        self.ops.upload_file(&key, bytes, content_type).await
    }

    async fn delete_image(&self, url: &str) -> anyhow::Result<()> {
        match self.ops.config().key_for_url(url) {
            Some(key) => self.ops.delete_file(&key).await,
            None => {
                tracing::debug!(url, "image url is not in the media bucket, nothing to delete");
                Ok(())
            }
        }
    }
}

/// Used when no bucket is configured: uploads are refused, deletes are no-ops.
pub struct DisabledMediaStore;

#[async_trait::async_trait]
impl MediaStore for DisabledMediaStore {
    async fn upload_image(&self, _bytes: Vec<u8>, _content_type: &str) -> anyhow::Result<String> {
        anyhow::bail!("media storage is not configured")
    }

    async fn delete_image(&self, _url: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Decoded image payload
#[derive(Debug, PartialEq, Eq)]
pub struct ImagePayload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Parse `data:image/<type>;base64,<data>` (or bare base64, assumed JPEG).
pub fn decode_image_payload(raw: &str) -> Result<ImagePayload> {
    let raw = raw.trim();
    let (content_type, data) = match raw.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest
                .split_once(',')
                .ok_or_else(|| AppError::InvalidArgument("Malformed image data URI".to_string()))?;
            let content_type = meta
                .strip_suffix(";base64")
                .ok_or_else(|| AppError::InvalidArgument("Image must be base64 encoded".to_string()))?;
            (content_type.to_string(), data)
        }
        None => ("image/jpeg".to_string(), raw),
    };

    if !content_type.starts_with("image/") {
        return Err(AppError::InvalidArgument(format!(
            "Unsupported media type: {}",
            content_type
        )));
    }

    let bytes = STANDARD
        .decode(data)
        .map_err(|_| AppError::InvalidArgument("Image is not valid base64".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::InvalidArgument("Image is empty".to_string()));
    }

    Ok(ImagePayload {
        content_type,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_uri() {
        let payload = decode_image_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(payload.content_type, "image/png");
        assert_eq!(payload.bytes, b"hello");
    }

    #[test]
    fn test_decode_bare_base64_defaults_to_jpeg() {
        let payload = decode_image_payload("aGVsbG8=").unwrap();
        assert_eq!(payload.content_type, "image/jpeg");
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        assert!(matches!(
            decode_image_payload("data:text/plain;base64,aGVsbG8="),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            decode_image_payload("data:image/png,raw"),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            decode_image_payload("%%%not-base64%%%"),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_disabled_store() {
        let store = DisabledMediaStore;
        assert!(!store.is_enabled());
        assert!(store.upload_image(vec![1], "image/png").await.is_err());
        assert!(store.delete_image("https://cdn/x.png").await.is_ok());
    }
}
