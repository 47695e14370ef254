//! Artifact repository
//!
//! Object listing, copy and delete against the data and artifact buckets.

use anyhow::{Context, Result};
use async_trait::async_trait;
use mlpipe_client::StorageClient;
use mlpipe_core::domain::artifact::ObjectSummary;
use mlpipe_core::dto::lifecycle::CopyObject;

#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>>;

    /// Copies `source_key` to `destination_key` inside `bucket`
    async fn copy_object(&self, bucket: &str, source_key: &str, destination_key: &str)
    -> Result<()>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;
}

/// HTTP implementation of ArtifactRepository
pub struct HttpArtifactRepository {
    client: StorageClient,
}

impl HttpArtifactRepository {
    pub fn new(storage_api_url: &str) -> Self {
        Self {
            client: StorageClient::new(storage_api_url),
        }
    }
}

#[async_trait]
impl ArtifactRepository for HttpArtifactRepository {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>> {
        self.client
            .list_objects(bucket, prefix)
            .await
            .with_context(|| format!("Failed to list {}/{}", bucket, prefix))
    }

    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
    ) -> Result<()> {
        let copy = CopyObject {
            source_key: source_key.to_string(),
            destination_key: destination_key.to_string(),
        };

        self.client
            .copy_object(bucket, &copy)
            .await
            .with_context(|| format!("Failed to copy {} to {}", source_key, destination_key))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object(bucket, key)
            .await
            .with_context(|| format!("Failed to delete {}/{}", bucket, key))
    }
}
