//! Artifact storage client

use mlpipe_core::domain::artifact::ObjectSummary;
use mlpipe_core::dto::lifecycle::CopyObject;
use reqwest::Client;

use crate::error::Result;
use crate::{handle_empty_response, handle_response, normalize_base_url};

/// HTTP client for the object storage API
#[derive(Debug, Clone)]
pub struct StorageClient {
    base_url: String,
    client: Client,
}

impl StorageClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List objects under a prefix
    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let url = format!("{}/buckets/{}/objects", self.base_url, bucket);
        let response = self
            .client
            .get(&url)
            .query(&[("prefix", prefix)])
            .send()
            .await?;

        handle_response(response).await
    }

    /// Copy an object within a bucket
    pub async fn copy_object(&self, bucket: &str, copy: &CopyObject) -> Result<()> {
        let url = format!("{}/buckets/{}/copy", self.base_url, bucket);
        let response = self.client.post(&url).json(copy).send().await?;

        handle_empty_response(response).await
    }

    /// Delete an object
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let url = format!("{}/buckets/{}/objects", self.base_url, bucket);
        let response = self
            .client
            .delete(&url)
            .query(&[("key", key)])
            .send()
            .await?;

        handle_empty_response(response).await
    }
}
