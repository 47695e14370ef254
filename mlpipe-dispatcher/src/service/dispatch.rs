//! Job Dispatcher
//!
//! Launches the compute job for an action at most once while a previous
//! launch of the same action is still in flight. Idempotency comes from the
//! deterministic job id and the store's conditional claim; nothing here
//! takes an in-process lock.
//!
//! Dispatch is fire-and-forget: it returns as soon as the compute API
//! acknowledges the submission. Completion arrives later through the job
//! service.

use chrono::Utc;
use mlpipe_core::domain::action::{Action, DatasetRef};
use mlpipe_core::domain::artifact::MODELS_PREFIX;
use mlpipe_core::domain::job::{FailureKind, JobFailure, JobRecord, JobStatus};
use mlpipe_core::domain::metric::METRIC_NAMESPACE;
use mlpipe_core::domain::network::NetworkResolution;
use mlpipe_core::dto::compute::SubmitJob;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::repository::{Claim, ComputeError, ComputeRepository, JobStore, StoreError, Transition};
use crate::service::monitoring::Monitor;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed action or rejected by the compute API; not retried
    #[error("job {job_id} submission failed: {message}")]
    Submission { job_id: String, message: String },

    /// No subnets or no compute capacity; the trigger may be redelivered
    #[error("resources unavailable for job {job_id}: {message}")]
    ResourceUnavailable { job_id: String, message: String },

    #[error("job store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub execution_role: String,
    pub artifacts_bucket: String,
    pub inference_instance_type: String,
    pub inference_timeout_secs: u64,
    /// Submissions still unacknowledged after this are failed as unavailable
    pub submit_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub record: JobRecord,
    /// False when an in-flight record already held the job id
    pub launched: bool,
}

pub struct Dispatcher {
    store: Arc<dyn JobStore>,
    compute: Arc<dyn ComputeRepository>,
    monitor: Arc<Monitor>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn JobStore>,
        compute: Arc<dyn ComputeRepository>,
        monitor: Arc<Monitor>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            store,
            compute,
            monitor,
            settings,
        }
    }

    pub async fn dispatch(
        &self,
        action: Action,
        network: &NetworkResolution,
    ) -> Result<DispatchOutcome, DispatchError> {
        let candidate = JobRecord::pending(action, network.clone(), Utc::now());

        let record = match self.store.claim(candidate).await? {
            Claim::Created(record) => record,
            Claim::Existing(record) => {
                tracing::info!(
                    "Job {} already {} (attempt {}), not relaunching",
                    record.job_id,
                    record.status,
                    record.attempt
                );
                return Ok(DispatchOutcome {
                    record,
                    launched: false,
                });
            }
        };

        if let Err(message) = record.action.validate() {
            return Err(self.fail(record, FailureKind::Submission, message).await);
        }

        if record.network_ref.subnet_ids.is_empty() {
            let message = format!("network {} has no subnets", record.network_ref.network_id);
            return Err(self.fail(record, FailureKind::ResourceUnavailable, message).await);
        }

        let request = self.submission(&record);

        let submitted =
            tokio::time::timeout(self.settings.submit_timeout, self.compute.submit(&request)).await;

        let handle = match submitted {
            Ok(Ok(handle)) => handle,
            Err(_) => {
                let message = format!(
                    "no acknowledgement for {} within {:?}",
                    request.job_name, self.settings.submit_timeout
                );
                return Err(self.fail(record, FailureKind::ResourceUnavailable, message).await);
            }
            Ok(Err(ComputeError::Unavailable(message))) => {
                return Err(self.fail(record, FailureKind::ResourceUnavailable, message).await);
            }
            Ok(Err(ComputeError::Rejected(message))) => {
                return Err(self.fail(record, FailureKind::Submission, message).await);
            }
        };

        let transition = Transition::new(&record, JobStatus::Running).with_handle(&handle.job_arn);
        let record = match self.store.transition(&transition).await? {
            Some(running) => running,
            None => {
                // Moved on while we were submitting (reaped); report what the store holds
                tracing::error!(
                    "Job {} changed state during submission of {}; compute job left untracked",
                    record.job_id,
                    handle.job_name
                );
                self.store.find_by_id(&record.job_id).await?.unwrap_or(record)
            }
        };

        tracing::info!(
            "Job {} dispatched as {} ({}, attempt {})",
            record.job_id,
            handle.job_name,
            record.action.kind(),
            record.attempt
        );
        self.monitor.job_launched(&record).await;

        Ok(DispatchOutcome {
            record,
            launched: true,
        })
    }

    /// Moves a freshly claimed record to Failed and builds the matching error
    async fn fail(&self, record: JobRecord, kind: FailureKind, message: String) -> DispatchError {
        let job_id = record.job_id.clone();
        let failure = JobFailure::new(kind, message.clone());

        tracing::error!("Job {} failed to launch: {}", job_id, failure);

        let transition = Transition::new(&record, JobStatus::Failed).with_error(failure);
        if let Err(e) = self.store.transition(&transition).await {
            return DispatchError::Store(e);
        }

        self.monitor
            .dispatch_error(record.action.kind(), kind.as_str())
            .await;

        match kind {
            FailureKind::ResourceUnavailable => DispatchError::ResourceUnavailable { job_id, message },
            _ => DispatchError::Submission { job_id, message },
        }
    }

    fn submission(&self, record: &JobRecord) -> SubmitJob {
        let artifacts = |key: &str| DatasetRef::new(&self.settings.artifacts_bucket, key).uri();

        let mut environment = BTreeMap::new();
        environment.insert("JOB_ID".to_string(), record.job_id.clone());
        environment.insert("ATTEMPT".to_string(), record.attempt.to_string());

        let (instance_type, input_ref, output_ref, timeout_seconds) = match &record.action {
            Action::TrainModel {
                dataset_ref,
                instance_type,
                max_duration_secs,
            } => (
                instance_type.clone(),
                dataset_ref.uri(),
                artifacts(MODELS_PREFIX),
                *max_duration_secs,
            ),
            Action::RunBatchInference {
                input_ref,
                output_prefix,
                model_ref,
            } => {
                environment.insert("MODEL_URI".to_string(), artifacts(model_ref));
                (
                    self.settings.inference_instance_type.clone(),
                    input_ref.uri(),
                    artifacts(output_prefix),
                    self.settings.inference_timeout_secs,
                )
            }
        };

        let mut tags = BTreeMap::new();
        tags.insert("Project".to_string(), METRIC_NAMESPACE.to_string());
        tags.insert("ManagedBy".to_string(), "mlpipe".to_string());
        tags.insert("JobId".to_string(), record.job_id.clone());

        SubmitJob {
            job_name: record.compute_job_name(),
            kind: record.action.kind(),
            role: self.settings.execution_role.clone(),
            instance_type,
            input_ref,
            output_ref,
            subnet_ids: record.network_ref.subnet_ids.clone(),
            security_group_ids: record.network_ref.security_group_ids.clone(),
            timeout_seconds,
            environment,
            tags,
        }
    }
}
