//! Background loops
//!
//! Each loop runs in its own task on a fixed interval and only logs its
//! failures; none of them can stop the dispatcher.

use chrono::Utc;
use mlpipe_core::domain::trigger::Trigger;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::service::intake::TriggerIntake;
use crate::service::job::JobService;
use crate::service::monitoring::Monitor;
use crate::state::AppState;

/// Reaper never runs more often than this
const MIN_REAP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct BackgroundSettings {
    /// Built-in schedule; disabled when `None`
    pub schedule_interval: Option<Duration>,
    pub schedule_rule_id: String,
    pub alarm_eval_interval: Duration,
    pub pending_grace: Duration,
}

impl From<&Config> for BackgroundSettings {
    fn from(config: &Config) -> Self {
        Self {
            schedule_interval: config.schedule_interval,
            schedule_rule_id: config.schedule_rule_id.clone(),
            alarm_eval_interval: config.alarm_eval_interval,
            pending_grace: config.pending_grace,
        }
    }
}

/// Handles of the running loops; dropping this aborts them
pub struct BackgroundTasks {
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn start(state: &AppState, settings: BackgroundSettings) -> Self {
        let mut handles = vec![
            spawn_alarm_evaluator(Arc::clone(&state.monitor), settings.alarm_eval_interval),
            spawn_pending_reaper(Arc::clone(&state.jobs), settings.pending_grace),
        ];

        match settings.schedule_interval {
            Some(interval) => handles.push(spawn_schedule_ticker(
                Arc::clone(&state.intake),
                settings.schedule_rule_id,
                interval,
            )),
            None => debug!("Built-in schedule disabled"),
        }

        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Emits a Scheduled trigger every `interval`, starting one interval from now
fn spawn_schedule_ticker(
    intake: Arc<TriggerIntake>,
    rule_id: String,
    interval: Duration,
) -> JoinHandle<()> {
    info!("Starting schedule {} (interval: {:?})", rule_id, interval);

    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + interval, interval);

        loop {
            ticker.tick().await;

            let trigger = Trigger::Scheduled {
                rule_id: rule_id.clone(),
                fired_at: Utc::now(),
            };

            match intake.handle(trigger).await {
                Ok(response) => info!("Schedule {} fired: {:?}", rule_id, response.outcome),
                Err(e) => error!("Schedule {} failed: {}", rule_id, e),
            }
        }
    })
}

fn spawn_alarm_evaluator(monitor: Arc<Monitor>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);

        loop {
            ticker.tick().await;
            monitor.evaluate_and_report(Utc::now());
        }
    })
}

fn spawn_pending_reaper(jobs: Arc<JobService>, grace: Duration) -> JoinHandle<()> {
    let interval = (grace / 2).max(MIN_REAP_INTERVAL);

    tokio::spawn(async move {
        let mut ticker = time::interval(interval);

        loop {
            ticker.tick().await;

            match jobs.reap_stale_pending(grace).await {
                Ok(reaped) if !reaped.is_empty() => {
                    info!("Marked {} abandoned pending job(s) as failed", reaped.len())
                }
                Ok(_) => {}
                Err(e) => error!("Pending reaper failed: {:?}", e),
            }
        }
    })
}
