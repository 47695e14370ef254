//! Monitoring domain model
//!
//! Metric samples emitted to the monitoring backend and the alarm view
//! computed from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Namespace all pipeline metrics are published under
pub const METRIC_NAMESPACE: &str = "ML-Pipeline";

pub const TRAINING_JOB_STARTED: &str = "TrainingJobStarted";
pub const BATCH_INFERENCE_STARTED: &str = "BatchInferenceStarted";
pub const DISPATCH_ERRORS: &str = "DispatchErrors";
pub const JOB_SUCCEEDED: &str = "JobSucceeded";
pub const JOB_FAILED: &str = "JobFailed";
pub const JOB_DURATION: &str = "JobDuration";
pub const DATA_FILE_PROCESSED: &str = "DataFileProcessed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    Count,
    Seconds,
}

/// One data point sent to the monitoring backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub namespace: String,
    pub metric_name: String,
    pub value: f64,
    pub unit: MetricUnit,
    pub dimensions: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl MetricSample {
    pub fn count(metric_name: &str, value: f64) -> Self {
        Self::new(metric_name, value, MetricUnit::Count)
    }

    pub fn seconds(metric_name: &str, value: f64) -> Self {
        Self::new(metric_name, value, MetricUnit::Seconds)
    }

    fn new(metric_name: &str, value: f64, unit: MetricUnit) -> Self {
        Self {
            namespace: METRIC_NAMESPACE.to_string(),
            metric_name: metric_name.to_string(),
            value,
            unit,
            dimensions: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_dimension(mut self, key: &str, value: impl Into<String>) -> Self {
        self.dimensions.insert(key.to_string(), value.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Alarms evaluated over the sliding window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmKind {
    /// Too many dispatch or job errors in the window
    ErrorCount,
    /// Mean job duration in the window above the ceiling
    AverageDuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmStatus {
    Ok,
    Firing,
}

/// Current state of one alarm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub kind: AlarmKind,
    pub status: AlarmStatus,
    pub observed: f64,
    pub threshold: f64,
    pub window_secs: u64,
    pub evaluated_at: DateTime<Utc>,
}

impl Alarm {
    pub fn is_firing(&self) -> bool {
        self.status == AlarmStatus::Firing
    }
}
