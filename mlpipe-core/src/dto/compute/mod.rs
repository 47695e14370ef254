//! Compute job API DTOs
//!
//! Request and response shapes of the external compute-job service the
//! dispatcher submits training and inference jobs to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::action::ActionKind;

/// Job submission accepted by the compute API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitJob {
    pub job_name: String,
    pub kind: ActionKind,
    pub role: String,
    pub instance_type: String,
    pub input_ref: String,
    pub output_ref: String,
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
    /// Wall-clock budget after which the compute service stops the job
    pub timeout_seconds: u64,
    pub environment: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
}

/// Handle returned once the compute API acknowledges a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_name: String,
    pub job_arn: String,
}
