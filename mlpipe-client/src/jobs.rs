//! Job, alarm and lifecycle endpoints

use mlpipe_core::domain::job::{JobRecord, JobStatus};
use mlpipe_core::domain::metric::Alarm;
use mlpipe_core::dto::job::CompleteJob;
use mlpipe_core::dto::lifecycle::{ProcessRawReport, PruneModels, PruneReport};

use crate::error::Result;
use crate::{DispatcherClient, handle_empty_response, handle_response};

impl DispatcherClient {
    // =============================================================================
    // Jobs
    // =============================================================================

    /// Get a job record by its derived id
    pub async fn get_job(&self, job_id: &str) -> Result<JobRecord> {
        let url = format!("{}/job/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        handle_response(response).await
    }

    /// List job records, optionally filtered by status
    pub async fn list_jobs(&self, status: Option<JobStatus>) -> Result<Vec<JobRecord>> {
        let url = format!("{}/job/list", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        let response = request.send().await?;

        handle_response(response).await
    }

    /// Report the terminal status of a job
    pub async fn complete_job(&self, job_id: &str, report: &CompleteJob) -> Result<()> {
        let url = format!("{}/job/{}/complete", self.base_url, job_id);
        let response = self.client.post(&url).json(report).send().await?;

        handle_empty_response(response).await
    }

    // =============================================================================
    // Monitoring
    // =============================================================================

    /// Current alarm evaluation
    pub async fn alarms(&self) -> Result<Vec<Alarm>> {
        let url = format!("{}/alarms", self.base_url);
        let response = self.client.get(&url).send().await?;

        handle_response(response).await
    }

    // =============================================================================
    // Lifecycle
    // =============================================================================

    /// Promote every raw data file to the processed prefix
    pub async fn process_raw(&self) -> Result<ProcessRawReport> {
        let url = format!("{}/lifecycle/process-raw", self.base_url);
        let response = self.client.post(&url).send().await?;

        handle_response(response).await
    }

    /// Delete all but the most recent model artifacts
    pub async fn prune_models(&self, keep: Option<usize>) -> Result<PruneReport> {
        let url = format!("{}/lifecycle/prune-models", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&PruneModels { keep })
            .send()
            .await?;

        handle_response(response).await
    }
}
