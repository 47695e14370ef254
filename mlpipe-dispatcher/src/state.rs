//! Shared application state
//!
//! Wires repositories into services once at startup. Handlers and background
//! loops receive clones of the `Arc`s held here.

use std::sync::Arc;

use crate::config::Config;
use crate::repository::{
    ArtifactRepository, ComputeRepository, HttpArtifactRepository, HttpComputeRepository,
    HttpMetricsRepository, HttpNetworkRepository, JobStore, LogMetricsRepository,
    MetricsRepository, NetworkRepository,
};
use crate::service::dispatch::Dispatcher;
use crate::service::intake::TriggerIntake;
use crate::service::job::JobService;
use crate::service::lifecycle::LifecycleService;
use crate::service::monitoring::Monitor;
use crate::service::network::NetworkResolver;
use crate::service::router::TriggerRouter;

/// Every external seam the services depend on
pub struct Repositories {
    pub store: Arc<dyn JobStore>,
    pub compute: Arc<dyn ComputeRepository>,
    pub networks: Arc<dyn NetworkRepository>,
    pub metrics: Arc<dyn MetricsRepository>,
    pub artifacts: Arc<dyn ArtifactRepository>,
}

impl Repositories {
    /// HTTP adapters for every external service, around the given store
    pub fn http(config: &Config, store: Arc<dyn JobStore>) -> anyhow::Result<Self> {
        let metrics: Arc<dyn MetricsRepository> = match &config.metrics_api_url {
            Some(url) => Arc::new(HttpMetricsRepository::new(url)),
            None => {
                tracing::info!("METRICS_API_URL not set, metrics are only logged");
                Arc::new(LogMetricsRepository)
            }
        };

        Ok(Self {
            store,
            compute: Arc::new(HttpComputeRepository::new(
                &config.compute_api_url,
                config.compute_timeout,
            )?),
            networks: Arc::new(HttpNetworkRepository::new(&config.network_api_url)),
            metrics,
            artifacts: Arc::new(HttpArtifactRepository::new(&config.storage_api_url)),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<NetworkResolver>,
    pub intake: Arc<TriggerIntake>,
    pub jobs: Arc<JobService>,
    pub monitor: Arc<Monitor>,
    pub lifecycle: Arc<LifecycleService>,
}

impl AppState {
    pub fn new(config: &Config, repositories: Repositories) -> Self {
        let monitor = Arc::new(Monitor::new(
            repositories.metrics,
            config.alarm_thresholds(),
        ));

        let resolver = Arc::new(NetworkResolver::new(
            repositories.networks,
            config.resolver_settings(),
        ));

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&repositories.store),
            repositories.compute,
            Arc::clone(&monitor),
            config.dispatch_settings(),
        ));

        let intake = Arc::new(TriggerIntake::new(
            TriggerRouter::new(config.router_config()),
            Arc::clone(&resolver),
            dispatcher,
        ));

        let jobs = Arc::new(JobService::new(repositories.store, Arc::clone(&monitor)));

        let lifecycle = Arc::new(LifecycleService::new(
            repositories.artifacts,
            Arc::clone(&monitor),
            config.lifecycle_settings(),
        ));

        Self {
            resolver,
            intake,
            jobs,
            monitor,
            lifecycle,
        }
    }
}
