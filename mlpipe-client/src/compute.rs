//! Compute job API client
//!
//! Submits training and inference jobs to the managed compute service.
//! Polling and completion notification are the service's responsibility.

use mlpipe_core::dto::compute::{JobHandle, SubmitJob};
use reqwest::Client;
use std::time::Duration;

use crate::error::Result;
use crate::{handle_response, normalize_base_url};

/// HTTP client for the compute job API
#[derive(Debug, Clone)]
pub struct ComputeClient {
    base_url: String,
    client: Client,
}

impl ComputeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Client whose requests give up after `timeout`
    ///
    /// A timed-out request surfaces as a transient `RequestFailed`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
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

    /// Submit a job and return its handle once acknowledged
    pub async fn submit_job(&self, req: &SubmitJob) -> Result<JobHandle> {
        let url = format!("{}/jobs", self.base_url);
        tracing::debug!("Submitting compute job {} to {}", req.job_name, url);

        let response = self.client.post(&url).json(req).send().await?;

        handle_response(response).await
    }
}
