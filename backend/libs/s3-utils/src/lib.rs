/// Shared S3 utilities
///
/// Wraps the AWS S3 client with the bucket configuration used for
/// user-uploaded images.
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client;
use std::sync::Arc;

pub mod config;
pub mod operations;

pub use config::S3Config;
pub use operations::S3Operations;

/// Shared S3 client wrapper
#[derive(Clone)]
pub struct S3Client {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Client {
    /// Create a client for the given bucket configuration.
    ///
    /// Credentials come from the standard AWS environment chain.
    pub async fn with_config(config: S3Config) -> Self {
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        let client = Client::new(&aws_config);

        Self {
            client: Arc::new(client),
            config,
        }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    pub fn operations(&self) -> S3Operations {
        S3Operations::new(self.client.clone(), self.config.clone())
    }

    /// Health check for S3 connectivity
    pub async fn health_check(&self) -> anyhow::Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await?;

        Ok(())
    }
}
