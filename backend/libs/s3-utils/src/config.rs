/// S3 configuration for the media bucket
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Base URL for public access (CDN domain or path-style endpoint)
    pub base_url: String,
    /// Key prefix for uploaded images
    pub image_prefix: String,
}

impl S3Config {
    /// Load S3 configuration from environment variables.
    ///
    /// Returns `None` when `S3_BUCKET` is not set, which disables media storage.
    pub fn from_env() -> Option<Self> {
        let bucket = std::env::var("S3_BUCKET").ok().filter(|b| !b.is_empty())?;
        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let base_url = std::env::var("S3_BASE_URL")
            .unwrap_or_else(|_| format!("https://{}.s3.{}.amazonaws.com", bucket, region));

        Some(Self {
            bucket,
            region,
            base_url: base_url.trim_end_matches('/').to_string(),
            image_prefix: std::env::var("S3_IMAGE_PREFIX").unwrap_or_else(|_| "images".to_string()),
        })
    }

    /// Public URL for an object key
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    /// Resolve a public URL back to its object key.
    ///
    /// Only URLs under `base_url` belong to this bucket; anything else yields `None`.
    pub fn key_for_url(&self, url: &str) -> Option<String> {
        let rest = url.strip_prefix(&self.base_url)?.strip_prefix('/')?;
        let key = rest.split(['?', '#']).next().unwrap_or_default();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }

    /// Fresh object key for an image of the given content type
    pub fn new_image_key(&self, content_type: &str) -> String {
        let ext = match content_type {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "jpg",
        };
        format!("{}/{}.{}", self.image_prefix, uuid::Uuid::new_v4(), ext)
    }
}
