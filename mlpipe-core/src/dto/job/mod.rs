//! Job DTOs for inter-service communication

use serde::{Deserialize, Serialize};

use crate::domain::job::{JobFailure, JobStatus};

/// Terminal status report from the compute service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteJob {
    /// Attempt the reporting compute job was launched as
    pub attempt: i32,
    pub status: JobStatus,
    pub error: Option<JobFailure>,
}

/// Filter for job listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobListQuery {
    pub status: Option<JobStatus>,
}
