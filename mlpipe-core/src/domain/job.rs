//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::Action;
use super::network::NetworkResolution;

/// Dispatch record for one logical job
///
/// Created when the dispatcher accepts an action and mutated only as the
/// underlying compute job transitions. Terminal once `Succeeded` or `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    /// Launch count under this job id; bumped on re-dispatch after a terminal state
    pub attempt: i32,
    pub action: Action,
    pub network_ref: NetworkResolution,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub error: Option<JobFailure>,
    /// Handle returned by the compute API once submission is acknowledged
    pub external_handle: Option<String>,
}

impl JobRecord {
    /// A fresh record about to be claimed
    pub fn pending(action: Action, network_ref: NetworkResolution, now: DateTime<Utc>) -> Self {
        Self {
            job_id: action.job_id(),
            attempt: 1,
            action,
            network_ref,
            status: JobStatus::Pending,
            started_at: now,
            ended_at: None,
            error: None,
            external_handle: None,
        }
    }

    /// Name of the compute-side job for this attempt
    pub fn compute_job_name(&self) -> String {
        format!("{}-{}", self.job_id, self.attempt)
    }

    /// Wall-clock seconds between start and end, if ended
    pub fn duration_secs(&self) -> Option<f64> {
        self.ended_at
            .map(|ended| (ended - self.started_at).num_milliseconds() as f64 / 1000.0)
    }
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Pending → Running → {Succeeded | Failed}, and Pending → Failed
    pub fn can_transition_to(&self, target: JobStatus) -> bool {
        matches!(
            (self, target),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Succeeded)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Running => "Running",
            JobStatus::Succeeded => "Succeeded",
            JobStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "succeeded" => Ok(JobStatus::Succeeded),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// Why a job ended in `Failed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for JobFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// The compute service stopped the job at its wall-clock budget
    Timeout,
    /// The compute API rejected the job request
    Submission,
    /// Network or compute capacity was missing at submission time
    ResourceUnavailable,
    /// The record stayed Pending past the grace period without a submission
    Abandoned,
    /// The job ran and failed on its own
    Execution,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "Timeout",
            FailureKind::Submission => "Submission",
            FailureKind::ResourceUnavailable => "ResourceUnavailable",
            FailureKind::Abandoned => "Abandoned",
            FailureKind::Execution => "Execution",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FailureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Timeout" => Ok(FailureKind::Timeout),
            "Submission" => Ok(FailureKind::Submission),
            "ResourceUnavailable" => Ok(FailureKind::ResourceUnavailable),
            "Abandoned" => Ok(FailureKind::Abandoned),
            "Execution" => Ok(FailureKind::Execution),
            other => Err(format!("unknown failure kind: {}", other)),
        }
    }
}
