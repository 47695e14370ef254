//! Job Record Store
//!
//! Durable record of every launched job. All writes are conditional: a claim
//! only replaces a terminal record, and a status transition only applies when
//! the record is still in the expected state and attempt.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mlpipe_core::domain::action::Action;
use mlpipe_core::domain::job::{FailureKind, JobFailure, JobRecord, JobStatus};
use mlpipe_core::domain::network::NetworkResolution;
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to serialize job record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt job record {job_id}: {reason}")]
    Corrupt { job_id: String, reason: String },

    #[error("job record {0} disappeared during claim")]
    Vanished(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a claim against the store
#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    /// The candidate was written (fresh, or replacing a terminal record)
    Created(JobRecord),
    /// A non-terminal record already holds the id; it is returned unchanged
    Existing(JobRecord),
}

/// Conditional status change
#[derive(Debug, Clone)]
pub struct Transition {
    pub job_id: String,
    pub attempt: i32,
    pub from: JobStatus,
    pub to: JobStatus,
    pub error: Option<JobFailure>,
    pub external_handle: Option<String>,
    pub at: DateTime<Utc>,
}

impl Transition {
    pub fn new(record: &JobRecord, to: JobStatus) -> Self {
        Self {
            job_id: record.job_id.clone(),
            attempt: record.attempt,
            from: record.status,
            to,
            error: None,
            external_handle: None,
            at: Utc::now(),
        }
    }

    pub fn with_error(mut self, error: JobFailure) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.external_handle = Some(handle.into());
        self
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Atomically writes `candidate` unless a non-terminal record holds its id
    ///
    /// Replacing a terminal record increments its attempt counter.
    async fn claim(&self, candidate: JobRecord) -> StoreResult<Claim>;

    /// Applies the transition if the record is still at `from` and `attempt`
    ///
    /// Returns the updated record, or `None` when the precondition no longer
    /// holds.
    async fn transition(&self, transition: &Transition) -> StoreResult<Option<JobRecord>>;

    async fn find_by_id(&self, job_id: &str) -> StoreResult<Option<JobRecord>>;

    /// Most recent first
    async fn list(&self, status: Option<JobStatus>) -> StoreResult<Vec<JobRecord>>;

    /// Fails every Pending record started before `cutoff`
    async fn fail_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        failure: &JobFailure,
    ) -> StoreResult<Vec<JobRecord>>;
}

// =============================================================================
// Postgres
// =============================================================================

const COLUMNS: &str = "job_id, attempt, action, network_ref, status, started_at, ended_at, \
                       error_kind, error_message, external_handle";

/// Postgres-backed store over the `job_records` table
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn claim(&self, candidate: JobRecord) -> StoreResult<Claim> {
        let query = format!(
            r#"
            INSERT INTO job_records
                (job_id, attempt, kind, action, network_ref, status, started_at)
            VALUES ($1, 1, $2, $3, $4, $5, $6)
            ON CONFLICT (job_id) DO UPDATE SET
                attempt = job_records.attempt + 1,
                kind = EXCLUDED.kind,
                action = EXCLUDED.action,
                network_ref = EXCLUDED.network_ref,
                status = EXCLUDED.status,
                started_at = EXCLUDED.started_at,
                ended_at = NULL,
                error_kind = NULL,
                error_message = NULL,
                external_handle = NULL
            WHERE job_records.status IN ('Succeeded', 'Failed')
            RETURNING {COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(&candidate.job_id)
            .bind(candidate.action.kind().as_str())
            .bind(serde_json::to_value(&candidate.action)?)
            .bind(serde_json::to_value(&candidate.network_ref)?)
            .bind(JobStatus::Pending.as_str())
            .bind(candidate.started_at)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return Ok(Claim::Created(row.try_into()?));
        }

        let existing = self
            .find_by_id(&candidate.job_id)
            .await?
            .ok_or_else(|| StoreError::Vanished(candidate.job_id.clone()))?;

        Ok(Claim::Existing(existing))
    }

    async fn transition(&self, t: &Transition) -> StoreResult<Option<JobRecord>> {
        let ended_at = t.to.is_terminal().then_some(t.at);
        let (error_kind, error_message) = match &t.error {
            Some(failure) => (Some(failure.kind.as_str()), Some(failure.message.as_str())),
            None => (None, None),
        };

        let query = format!(
            r#"
            UPDATE job_records
            SET status = $1,
                ended_at = COALESCE($2, ended_at),
                error_kind = COALESCE($3, error_kind),
                error_message = COALESCE($4, error_message),
                external_handle = COALESCE($5, external_handle)
            WHERE job_id = $6 AND attempt = $7 AND status = $8
            RETURNING {COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(t.to.as_str())
            .bind(ended_at)
            .bind(error_kind)
            .bind(error_message)
            .bind(t.external_handle.as_deref())
            .bind(&t.job_id)
            .bind(t.attempt)
            .bind(t.from.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(JobRecord::try_from).transpose()
    }

    async fn find_by_id(&self, job_id: &str) -> StoreResult<Option<JobRecord>> {
        let query = format!("SELECT {COLUMNS} FROM job_records WHERE job_id = $1");

        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(JobRecord::try_from).transpose()
    }

    async fn list(&self, status: Option<JobStatus>) -> StoreResult<Vec<JobRecord>> {
        let rows = match status {
            Some(status) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM job_records WHERE status = $1 ORDER BY started_at DESC"
                );
                sqlx::query_as::<_, JobRow>(&query)
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!("SELECT {COLUMNS} FROM job_records ORDER BY started_at DESC");
                sqlx::query_as::<_, JobRow>(&query)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(JobRecord::try_from).collect()
    }

    async fn fail_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        failure: &JobFailure,
    ) -> StoreResult<Vec<JobRecord>> {
        let query = format!(
            r#"
            UPDATE job_records
            SET status = $1, ended_at = $2, error_kind = $3, error_message = $4
            WHERE status = $5 AND started_at < $6
            RETURNING {COLUMNS}
            "#
        );

        let rows = sqlx::query_as::<_, JobRow>(&query)
            .bind(JobStatus::Failed.as_str())
            .bind(Utc::now())
            .bind(failure.kind.as_str())
            .bind(&failure.message)
            .bind(JobStatus::Pending.as_str())
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(JobRecord::try_from).collect()
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    job_id: String,
    attempt: i32,
    action: serde_json::Value,
    network_ref: serde_json::Value,
    status: String,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    error_kind: Option<String>,
    error_message: Option<String>,
    external_handle: Option<String>,
}

impl TryFrom<JobRow> for JobRecord {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt {
            job_id: row.job_id.clone(),
            reason,
        };

        let action: Action =
            serde_json::from_value(row.action.clone()).map_err(|e| corrupt(e.to_string()))?;
        let network_ref: NetworkResolution =
            serde_json::from_value(row.network_ref.clone()).map_err(|e| corrupt(e.to_string()))?;
        let status: JobStatus = row.status.parse().map_err(corrupt)?;

        let error = match row.error_kind.as_deref() {
            Some(kind) => Some(JobFailure::new(
                kind.parse::<FailureKind>().map_err(corrupt)?,
                row.error_message.clone().unwrap_or_default(),
            )),
            None => None,
        };

        Ok(JobRecord {
            job_id: row.job_id,
            attempt: row.attempt,
            action,
            network_ref,
            status,
            started_at: row.started_at,
            ended_at: row.ended_at,
            error,
            external_handle: row.external_handle,
        })
    }
}
