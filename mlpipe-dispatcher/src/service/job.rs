//! Job Service
//!
//! Job queries, completion reports from the compute service, and the reaper
//! for records that never left Pending.

use chrono::Utc;
use mlpipe_core::domain::job::{FailureKind, JobFailure, JobRecord, JobStatus};
use mlpipe_core::dto::job::CompleteJob;
use std::sync::Arc;
use std::time::Duration;

use crate::repository::{JobStore, StoreError, Transition};
use crate::service::monitoring::Monitor;

/// Service error type
#[derive(Debug)]
pub enum JobError {
    NotFound(String),
    InvalidState(String),
    ValidationError(String),
    StoreError(StoreError),
}

impl From<StoreError> for JobError {
    fn from(err: StoreError) -> Self {
        JobError::StoreError(err)
    }
}

pub type Result<T> = std::result::Result<T, JobError>;

pub struct JobService {
    store: Arc<dyn JobStore>,
    monitor: Arc<Monitor>,
}

impl JobService {
    pub fn new(store: Arc<dyn JobStore>, monitor: Arc<Monitor>) -> Self {
        Self { store, monitor }
    }

    /// Get a job by ID
    pub async fn get_job(&self, job_id: &str) -> Result<JobRecord> {
        self.store
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))
    }

    /// List jobs, optionally filtered by status
    pub async fn list_jobs(&self, status: Option<JobStatus>) -> Result<Vec<JobRecord>> {
        Ok(self.store.list(status).await?)
    }

    /// Records the terminal status reported for a job
    ///
    /// Only accepted while the record is in flight and only from the attempt
    /// the record currently tracks. Succeeded is only valid for a Running
    /// record.
    pub async fn complete_job(&self, job_id: &str, report: CompleteJob) -> Result<JobRecord> {
        validate_report(&report)?;

        let current = self.get_job(job_id).await?;

        if report.attempt != current.attempt {
            return Err(JobError::InvalidState(format!(
                "Job {} is on attempt {}, report is for attempt {}",
                job_id, current.attempt, report.attempt
            )));
        }

        if !current.status.can_transition_to(report.status) {
            return Err(JobError::InvalidState(format!(
                "Job {} cannot move from {} to {}",
                job_id, current.status, report.status
            )));
        }

        let mut transition = Transition::new(&current, report.status);
        if let Some(error) = report.error {
            transition = transition.with_error(error);
        } else if report.status == JobStatus::Failed {
            transition = transition.with_error(JobFailure::new(
                FailureKind::Execution,
                "job reported failure without details",
            ));
        }

        let record = self.store.transition(&transition).await?.ok_or_else(|| {
            JobError::InvalidState(format!("Job {} changed state concurrently", job_id))
        })?;

        match &record.error {
            Some(failure) => tracing::warn!(
                "Job {} (attempt {}) finished {}: {}",
                record.job_id,
                record.attempt,
                record.status,
                failure
            ),
            None => tracing::info!(
                "Job {} (attempt {}) finished {}",
                record.job_id,
                record.attempt,
                record.status
            ),
        }

        self.monitor.job_finished(&record).await;

        Ok(record)
    }

    /// Fails Pending records older than `grace`
    ///
    /// A crash between claim and submission would otherwise leave a Pending
    /// record blocking redelivery forever.
    pub async fn reap_stale_pending(&self, grace: Duration) -> Result<Vec<JobRecord>> {
        let grace = chrono::Duration::from_std(grace)
            .map_err(|e| JobError::ValidationError(e.to_string()))?;
        let failure = JobFailure::new(
            FailureKind::Abandoned,
            format!("still pending after {}s", grace.num_seconds()),
        );

        let reaped = self
            .store
            .fail_stale_pending(Utc::now() - grace, &failure)
            .await?;

        for record in &reaped {
            tracing::warn!("Job {} abandoned while pending", record.job_id);
            self.monitor.job_finished(record).await;
        }

        Ok(reaped)
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_report(report: &CompleteJob) -> Result<()> {
    if !report.status.is_terminal() {
        return Err(JobError::ValidationError(format!(
            "Invalid completion status: {}",
            report.status
        )));
    }

    if report.status == JobStatus::Succeeded && report.error.is_some() {
        return Err(JobError::ValidationError(
            "A succeeded job cannot carry an error".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{Claim, InMemoryJobStore};
    use crate::testing::{RecordingMetrics, monitor, network, train_action};
    use mlpipe_core::domain::metric::{JOB_DURATION, JOB_FAILED, JOB_SUCCEEDED};

    fn report(status: JobStatus, error: Option<JobFailure>) -> CompleteJob {
        CompleteJob {
            attempt: 1,
            status,
            error,
        }
    }

    async fn running_job(store: &InMemoryJobStore) -> JobRecord {
        let candidate = JobRecord::pending(train_action("raw/input.csv"), network(), Utc::now());
        let Claim::Created(record) = store.claim(candidate).await.unwrap() else {
            panic!("expected fresh claim");
        };
        store
            .transition(&Transition::new(&record, JobStatus::Running).with_handle("arn:job/1"))
            .await
            .unwrap()
            .unwrap()
    }

    fn service(store: Arc<InMemoryJobStore>, metrics: Arc<RecordingMetrics>) -> JobService {
        JobService::new(store, monitor(metrics))
    }

    #[test]
    fn test_validate_report() {
        assert!(validate_report(&report(JobStatus::Succeeded, None)).is_ok());
        assert!(validate_report(&report(JobStatus::Failed, None)).is_ok());
        assert!(validate_report(&report(JobStatus::Running, None)).is_err());
        assert!(validate_report(&report(JobStatus::Pending, None)).is_err());

        let failure = JobFailure::new(FailureKind::Timeout, "stopped");
        assert!(validate_report(&report(JobStatus::Succeeded, Some(failure))).is_err());
    }

    #[tokio::test]
    async fn test_complete_running_job() {
        let store = Arc::new(InMemoryJobStore::new());
        let metrics = Arc::new(RecordingMetrics::default());
        let job = running_job(&store).await;

        let done = service(store, metrics.clone())
            .complete_job(&job.job_id, report(JobStatus::Succeeded, None))
            .await
            .unwrap();

        assert_eq!(done.status, JobStatus::Succeeded);
        assert!(done.ended_at.is_some());
        assert_eq!(
            metrics.names(),
            vec![JOB_SUCCEEDED.to_string(), JOB_DURATION.to_string()]
        );
    }

    #[tokio::test]
    async fn test_timeout_report_is_recorded() {
        let store = Arc::new(InMemoryJobStore::new());
        let metrics = Arc::new(RecordingMetrics::default());
        let job = running_job(&store).await;

        let failure = JobFailure::new(FailureKind::Timeout, "max runtime exceeded");
        let done = service(store, metrics.clone())
            .complete_job(&job.job_id, report(JobStatus::Failed, Some(failure.clone())))
            .await
            .unwrap();

        assert_eq!(done.error, Some(failure));
        assert_eq!(metrics.names()[0], JOB_FAILED);
    }

    #[tokio::test]
    async fn test_failure_without_details_gets_execution_kind() {
        let store = Arc::new(InMemoryJobStore::new());
        let job = running_job(&store).await;

        let done = service(store, Arc::new(RecordingMetrics::default()))
            .complete_job(&job.job_id, report(JobStatus::Failed, None))
            .await
            .unwrap();

        assert_eq!(done.error.unwrap().kind, FailureKind::Execution);
    }

    #[tokio::test]
    async fn test_terminal_job_rejects_completion() {
        let store = Arc::new(InMemoryJobStore::new());
        let job = running_job(&store).await;
        let service = service(store, Arc::new(RecordingMetrics::default()));

        service
            .complete_job(&job.job_id, report(JobStatus::Succeeded, None))
            .await
            .unwrap();

        let again = service
            .complete_job(&job.job_id, report(JobStatus::Failed, None))
            .await;
        assert!(matches!(again, Err(JobError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_report_from_earlier_attempt_is_rejected() {
        let store = Arc::new(InMemoryJobStore::new());
        let first = running_job(&store).await;
        let service = service(store.clone(), Arc::new(RecordingMetrics::default()));

        let timeout = JobFailure::new(FailureKind::Timeout, "max runtime exceeded");
        service
            .complete_job(&first.job_id, report(JobStatus::Failed, Some(timeout)))
            .await
            .unwrap();

        // Redelivery relaunches the same job id as attempt 2
        let candidate = JobRecord::pending(train_action("raw/input.csv"), network(), Utc::now());
        let Claim::Created(second) = store.claim(candidate).await.unwrap() else {
            panic!("expected re-claim of terminal record");
        };
        assert_eq!(second.attempt, 2);
        store
            .transition(&Transition::new(&second, JobStatus::Running).with_handle("arn:job/2"))
            .await
            .unwrap()
            .unwrap();

        let stale = service
            .complete_job(&first.job_id, report(JobStatus::Succeeded, None))
            .await;
        assert!(matches!(stale, Err(JobError::InvalidState(_))));

        let record = service.get_job(&first.job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Running);
        assert_eq!(record.attempt, 2);

        let current = CompleteJob {
            attempt: 2,
            status: JobStatus::Succeeded,
            error: None,
        };
        let done = service.complete_job(&first.job_id, current).await.unwrap();
        assert_eq!(done.status, JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_complete_unknown_job() {
        let service = service(
            Arc::new(InMemoryJobStore::new()),
            Arc::new(RecordingMetrics::default()),
        );

        let result = service
            .complete_job("train-0000000000000000", report(JobStatus::Succeeded, None))
            .await;
        assert!(matches!(result, Err(JobError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reap_stale_pending() {
        let store = Arc::new(InMemoryJobStore::new());
        let mut stale = JobRecord::pending(train_action("raw/old.csv"), network(), Utc::now());
        stale.started_at = Utc::now() - chrono::Duration::minutes(10);
        store.claim(stale.clone()).await.unwrap();

        let service = service(store.clone(), Arc::new(RecordingMetrics::default()));
        let reaped = service
            .reap_stale_pending(Duration::from_secs(300))
            .await
            .unwrap();

        assert_eq!(reaped.len(), 1);
        let record = service.get_job(&stale.job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error.unwrap().kind, FailureKind::Abandoned);
    }
}
