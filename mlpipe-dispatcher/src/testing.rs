//! In-process fakes for the repository seams, shared by unit tests

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mlpipe_core::domain::action::{Action, DatasetRef};
use mlpipe_core::domain::artifact::ObjectSummary;
use mlpipe_core::domain::metric::MetricSample;
use mlpipe_core::domain::network::{Network, NetworkResolution, ResolutionSource, Subnet};
use mlpipe_core::dto::compute::{JobHandle, SubmitJob};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::Config;
use crate::repository::{
    ArtifactRepository, ComputeError, ComputeRepository, InMemoryJobStore, MetricsRepository,
    NetworkRepository,
};
use crate::service::dispatch::DispatchSettings;
use crate::service::intake::TriggerIntake;
use crate::service::monitoring::{AlarmThresholds, Monitor};
use crate::state::{AppState, Repositories};

// =============================================================================
// Fixtures
// =============================================================================

pub fn train_action(key: &str) -> Action {
    Action::TrainModel {
        dataset_ref: DatasetRef::new("data", key),
        instance_type: "ml.m5.large".to_string(),
        max_duration_secs: 3600,
    }
}

pub fn inference_action(input: &str) -> Action {
    Action::RunBatchInference {
        input_ref: DatasetRef::new("data", input),
        output_prefix: "processed/predictions/".to_string(),
        model_ref: "models/latest_model.joblib".to_string(),
    }
}

pub fn network() -> NetworkResolution {
    NetworkResolution {
        network_id: "vpc-1".to_string(),
        subnet_ids: vec!["subnet-a".to_string(), "subnet-b".to_string()],
        security_group_ids: vec!["sg-1".to_string()],
        source: ResolutionSource::PreferredPrivate,
    }
}

/// Subnet with an optional `Type` tier tag
pub fn subnet(id: &str, tier: Option<&str>) -> Subnet {
    let mut tags = BTreeMap::new();
    if let Some(tier) = tier {
        tags.insert("Type".to_string(), tier.to_string());
    }
    Subnet {
        id: id.to_string(),
        tags,
    }
}

pub fn default_only_inventory() -> Vec<Network> {
    vec![Network {
        id: "vpc-default".to_string(),
        is_default: true,
        subnets: vec![subnet("subnet-d1", None)],
        security_group_ids: vec!["sg-default".to_string()],
    }]
}

fn private_inventory() -> Vec<Network> {
    let mut inventory = default_only_inventory();
    inventory.push(Network {
        id: "vpc-1".to_string(),
        is_default: false,
        subnets: vec![subnet("subnet-a", Some("Private"))],
        security_group_ids: vec!["sg-1".to_string()],
    });
    inventory
}

pub fn dispatch_settings() -> DispatchSettings {
    DispatchSettings {
        execution_role: "role".to_string(),
        artifacts_bucket: "artifacts".to_string(),
        inference_instance_type: "ml.m5.xlarge".to_string(),
        inference_timeout_secs: 900,
        submit_timeout: Duration::from_millis(250),
    }
}

pub fn monitor(metrics: Arc<RecordingMetrics>) -> Arc<Monitor> {
    Arc::new(Monitor::new(
        metrics,
        AlarmThresholds {
            error_count: 5,
            window: Duration::from_secs(300),
            duration_ceiling: Duration::from_secs(3600),
        },
    ))
}

// =============================================================================
// Compute
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum ComputeMode {
    Accepting,
    Rejecting,
    Unavailable,
}

/// Records every submission, including the ones it refuses
pub struct FakeCompute {
    mode: Mutex<ComputeMode>,
    submissions: Mutex<Vec<SubmitJob>>,
    delay: Option<Duration>,
}

impl FakeCompute {
    fn with_mode(mode: ComputeMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            submissions: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Accepts jobs, but only after `delay`
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::accepting()
        }
    }

    pub fn accepting() -> Self {
        Self::with_mode(ComputeMode::Accepting)
    }

    pub fn rejecting() -> Self {
        Self::with_mode(ComputeMode::Rejecting)
    }

    pub fn unavailable() -> Self {
        Self::with_mode(ComputeMode::Unavailable)
    }

    pub fn set_accepting(&self) {
        *self.mode.lock().unwrap() = ComputeMode::Accepting;
    }

    pub fn submissions(&self) -> Vec<SubmitJob> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ComputeRepository for FakeCompute {
    async fn submit(&self, job: &SubmitJob) -> Result<JobHandle, ComputeError> {
        // Give concurrent dispatches a chance to interleave
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }

        let count = {
            let mut submissions = self.submissions.lock().unwrap();
            submissions.push(job.clone());
            submissions.len()
        };

        let mode = *self.mode.lock().unwrap();
        match mode {
            ComputeMode::Accepting => Ok(JobHandle {
                job_name: job.job_name.clone(),
                job_arn: format!("arn:job/{}", count),
            }),
            ComputeMode::Rejecting => Err(ComputeError::Rejected(
                "ValidationException: bad request".to_string(),
            )),
            ComputeMode::Unavailable => Err(ComputeError::Unavailable(
                "ResourceLimitExceeded".to_string(),
            )),
        }
    }
}

// =============================================================================
// Networks
// =============================================================================

pub struct FakeNetworks {
    inventory: Option<Vec<Network>>,
    calls: AtomicUsize,
}

impl FakeNetworks {
    pub fn new(inventory: Vec<Network>) -> Self {
        Self {
            inventory: Some(inventory),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            inventory: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkRepository for FakeNetworks {
    async fn list_networks(&self) -> Result<Vec<Network>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.inventory {
            Some(inventory) => Ok(inventory.clone()),
            None => bail!("network API unreachable"),
        }
    }
}

// =============================================================================
// Metrics
// =============================================================================

#[derive(Default)]
pub struct RecordingMetrics {
    samples: Mutex<Vec<MetricSample>>,
    fail: bool,
}

impl RecordingMetrics {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.samples
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.metric_name.clone())
            .collect()
    }
}

#[async_trait]
impl MetricsRepository for RecordingMetrics {
    async fn publish(&self, samples: &[MetricSample]) -> Result<()> {
        if self.fail {
            bail!("metrics API unreachable");
        }
        self.samples.lock().unwrap().extend_from_slice(samples);
        Ok(())
    }
}

// =============================================================================
// Artifacts
// =============================================================================

#[derive(Default)]
pub struct FakeArtifacts {
    objects: Mutex<BTreeMap<(String, String), ObjectSummary>>,
    failing_copies: Mutex<HashSet<String>>,
}

impl FakeArtifacts {
    pub fn put(&self, bucket: &str, key: &str, size: u64, last_modified: DateTime<Utc>) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            ObjectSummary {
                key: key.to_string(),
                size,
                last_modified,
            },
        );
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    pub fn fail_copy_of(&self, key: &str) {
        self.failing_copies.lock().unwrap().insert(key.to_string());
    }
}

#[async_trait]
impl ArtifactRepository for FakeArtifacts {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|((b, k), _)| b == bucket && k.starts_with(prefix))
            .map(|(_, object)| object.clone())
            .collect())
    }

    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
    ) -> Result<()> {
        if self.failing_copies.lock().unwrap().contains(source_key) {
            bail!("AccessDenied copying {}", source_key);
        }

        let mut objects = self.objects.lock().unwrap();
        let Some(source) = objects.get(&(bucket.to_string(), source_key.to_string())).cloned()
        else {
            bail!("NoSuchKey: {}", source_key);
        };

        objects.insert(
            (bucket.to_string(), destination_key.to_string()),
            ObjectSummary {
                key: destination_key.to_string(),
                size: source.size,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

// =============================================================================
// Wired application
// =============================================================================

/// Fully wired state over fakes, with the default configuration pointed at
/// the `data` and `artifacts` buckets
pub struct TestContext {
    pub state: AppState,
    pub intake: Arc<TriggerIntake>,
    pub store: Arc<InMemoryJobStore>,
    pub compute: Arc<FakeCompute>,
    pub metrics: Arc<RecordingMetrics>,
    pub artifacts: Arc<FakeArtifacts>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_inventory(private_inventory())
    }

    pub fn with_inventory(inventory: Vec<Network>) -> Self {
        let config = Config {
            data_bucket: "data".to_string(),
            artifacts_bucket: "artifacts".to_string(),
            ..Config::default()
        };

        let store = Arc::new(InMemoryJobStore::new());
        let compute = Arc::new(FakeCompute::accepting());
        let metrics = Arc::new(RecordingMetrics::default());
        let artifacts = Arc::new(FakeArtifacts::default());

        let state = AppState::new(
            &config,
            Repositories {
                store: store.clone(),
                compute: compute.clone(),
                networks: Arc::new(FakeNetworks::new(inventory)),
                metrics: metrics.clone(),
                artifacts: artifacts.clone(),
            },
        );

        Self {
            intake: Arc::clone(&state.intake),
            state,
            store,
            compute,
            metrics,
            artifacts,
        }
    }
}
