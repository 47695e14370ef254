//! Compute repository
//!
//! Submits training and inference jobs to the external compute-job API.

use async_trait::async_trait;
use mlpipe_client::{ClientError, ComputeClient};
use mlpipe_core::dto::compute::{JobHandle, SubmitJob};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComputeError {
    /// No capacity, throttled, or the API could not be reached
    #[error("compute resources unavailable: {0}")]
    Unavailable(String),

    /// The API refused the request itself
    #[error("compute API rejected the job: {0}")]
    Rejected(String),
}

impl From<ClientError> for ComputeError {
    fn from(err: ClientError) -> Self {
        if err.is_transient() {
            ComputeError::Unavailable(err.to_string())
        } else {
            ComputeError::Rejected(err.to_string())
        }
    }
}

#[async_trait]
pub trait ComputeRepository: Send + Sync {
    /// Submits a job; returns once the compute API acknowledges it
    async fn submit(&self, request: &SubmitJob) -> Result<JobHandle, ComputeError>;
}

/// HTTP implementation of ComputeRepository
pub struct HttpComputeRepository {
    client: ComputeClient,
}

impl HttpComputeRepository {
    pub fn new(compute_api_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: ComputeClient::with_timeout(compute_api_url, timeout)?,
        })
    }
}

#[async_trait]
impl ComputeRepository for HttpComputeRepository {
    async fn submit(&self, request: &SubmitJob) -> Result<JobHandle, ComputeError> {
        Ok(self.client.submit_job(request).await?)
    }
}
