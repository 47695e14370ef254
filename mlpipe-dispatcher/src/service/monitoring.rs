//! Monitoring & Alerting
//!
//! Forwards metric samples to the monitoring backend and keeps a sliding
//! window of errors and job durations in memory, from which the alarm set is
//! evaluated. Publishing failures are logged and never fail the caller.

use chrono::{DateTime, Utc};
use mlpipe_core::domain::action::ActionKind;
use mlpipe_core::domain::job::{JobRecord, JobStatus};
use mlpipe_core::domain::metric::{
    Alarm, AlarmKind, AlarmStatus, BATCH_INFERENCE_STARTED, DATA_FILE_PROCESSED, DISPATCH_ERRORS,
    JOB_DURATION, JOB_FAILED, JOB_SUCCEEDED, MetricSample, TRAINING_JOB_STARTED,
};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::repository::MetricsRepository;

#[derive(Debug, Clone)]
pub struct AlarmThresholds {
    /// Errors tolerated per window; one more fires the alarm
    pub error_count: u32,
    pub window: Duration,
    /// Mean job duration above which the duration alarm fires
    pub duration_ceiling: Duration,
}

/// Timestamped samples inside the current window
#[derive(Debug, Default)]
pub struct AlarmState {
    errors: VecDeque<(DateTime<Utc>, f64)>,
    durations: VecDeque<(DateTime<Utc>, f64)>,
}

impl AlarmState {
    /// Folds a sample in; samples not relevant to any alarm are ignored
    pub fn observe(&mut self, sample: &MetricSample) {
        match sample.metric_name.as_str() {
            DISPATCH_ERRORS | JOB_FAILED => self.errors.push_back((sample.timestamp, sample.value)),
            JOB_DURATION => self.durations.push_back((sample.timestamp, sample.value)),
            _ => {}
        }
    }

    fn prune(&mut self, cutoff: DateTime<Utc>) {
        self.errors.retain(|(at, _)| *at >= cutoff);
        self.durations.retain(|(at, _)| *at >= cutoff);
    }

    pub fn evaluate(&mut self, now: DateTime<Utc>, thresholds: &AlarmThresholds) -> Vec<Alarm> {
        let cutoff = chrono::Duration::from_std(thresholds.window)
            .ok()
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.prune(cutoff);

        let error_count: f64 = self.errors.iter().map(|(_, v)| v).sum();
        let mean_duration = if self.durations.is_empty() {
            0.0
        } else {
            self.durations.iter().map(|(_, v)| v).sum::<f64>() / self.durations.len() as f64
        };

        vec![
            alarm(
                AlarmKind::ErrorCount,
                error_count,
                thresholds.error_count as f64,
                thresholds,
                now,
            ),
            alarm(
                AlarmKind::AverageDuration,
                mean_duration,
                thresholds.duration_ceiling.as_secs_f64(),
                thresholds,
                now,
            ),
        ]
    }
}

fn alarm(
    kind: AlarmKind,
    observed: f64,
    threshold: f64,
    thresholds: &AlarmThresholds,
    now: DateTime<Utc>,
) -> Alarm {
    Alarm {
        kind,
        status: if observed > threshold {
            AlarmStatus::Firing
        } else {
            AlarmStatus::Ok
        },
        observed,
        threshold,
        window_secs: thresholds.window.as_secs(),
        evaluated_at: now,
    }
}

pub struct Monitor {
    repository: Arc<dyn MetricsRepository>,
    thresholds: AlarmThresholds,
    state: Mutex<AlarmState>,
    firing: Mutex<HashSet<AlarmKind>>,
}

impl Monitor {
    pub fn new(repository: Arc<dyn MetricsRepository>, thresholds: AlarmThresholds) -> Self {
        Self {
            repository,
            thresholds,
            state: Mutex::new(AlarmState::default()),
            firing: Mutex::new(HashSet::new()),
        }
    }

    /// Records a sample in the alarm window and publishes it
    pub async fn record(&self, sample: MetricSample) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(&sample);

        if let Err(e) = self.repository.publish(std::slice::from_ref(&sample)).await {
            tracing::error!("Failed to publish metric {}: {:#}", sample.metric_name, e);
        }
    }

    pub async fn job_launched(&self, record: &JobRecord) {
        let name = match record.action.kind() {
            ActionKind::Training => TRAINING_JOB_STARTED,
            ActionKind::Inference => BATCH_INFERENCE_STARTED,
        };

        self.record(MetricSample::count(name, 1.0).with_dimension("JobId", &record.job_id))
            .await;
    }

    pub async fn dispatch_error(&self, kind: ActionKind, reason: &str) {
        self.record(
            MetricSample::count(DISPATCH_ERRORS, 1.0)
                .with_dimension("JobKind", kind.as_str())
                .with_dimension("Reason", reason),
        )
        .await;
    }

    /// Outcome and duration of a job that reached a terminal state
    pub async fn job_finished(&self, record: &JobRecord) {
        let kind = record.action.kind().as_str();
        let name = match record.status {
            JobStatus::Succeeded => JOB_SUCCEEDED,
            _ => JOB_FAILED,
        };

        self.record(MetricSample::count(name, 1.0).with_dimension("JobKind", kind))
            .await;

        if let Some(duration) = record.duration_secs() {
            self.record(MetricSample::seconds(JOB_DURATION, duration).with_dimension("JobKind", kind))
                .await;
        }
    }

    pub async fn data_file_processed(&self, key: &str) {
        self.record(MetricSample::count(DATA_FILE_PROCESSED, 1.0).with_dimension("Key", key))
            .await;
    }

    /// Current alarm set
    pub fn evaluate(&self, now: DateTime<Utc>) -> Vec<Alarm> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .evaluate(now, &self.thresholds)
    }

    /// Evaluates and logs alarms that started or stopped firing since the
    /// previous call
    pub fn evaluate_and_report(&self, now: DateTime<Utc>) -> Vec<Alarm> {
        let alarms = self.evaluate(now);
        let mut firing = self.firing.lock().unwrap_or_else(PoisonError::into_inner);

        for alarm in &alarms {
            let was_firing = firing.contains(&alarm.kind);

            match (was_firing, alarm.is_firing()) {
                (false, true) => {
                    tracing::warn!(
                        "Alarm {:?} firing: observed {:.2} > threshold {:.2} over {}s",
                        alarm.kind,
                        alarm.observed,
                        alarm.threshold,
                        alarm.window_secs
                    );
                    firing.insert(alarm.kind);
                }
                (true, false) => {
                    tracing::info!("Alarm {:?} cleared", alarm.kind);
                    firing.remove(&alarm.kind);
                }
                _ => {}
            }
        }

        alarms
    }
}
