//! Metrics repository
//!
//! Publishes metric samples to the monitoring backend. When no backend is
//! configured the samples are only written to the log.

use anyhow::{Context, Result};
use async_trait::async_trait;
use mlpipe_client::CloudClient;
use mlpipe_core::domain::metric::MetricSample;

#[async_trait]
pub trait MetricsRepository: Send + Sync {
    async fn publish(&self, samples: &[MetricSample]) -> Result<()>;
}

/// HTTP implementation of MetricsRepository
pub struct HttpMetricsRepository {
    client: CloudClient,
}

impl HttpMetricsRepository {
    pub fn new(metrics_api_url: &str) -> Self {
        Self {
            client: CloudClient::new(metrics_api_url),
        }
    }
}

#[async_trait]
impl MetricsRepository for HttpMetricsRepository {
    async fn publish(&self, samples: &[MetricSample]) -> Result<()> {
        self.client
            .put_metric_data(samples)
            .await
            .context("Failed to publish metrics")
    }
}

/// Writes samples to the tracing output instead of a backend
pub struct LogMetricsRepository;

#[async_trait]
impl MetricsRepository for LogMetricsRepository {
    async fn publish(&self, samples: &[MetricSample]) -> Result<()> {
        for sample in samples {
            tracing::info!(
                namespace = %sample.namespace,
                metric = %sample.metric_name,
                value = sample.value,
                dimensions = ?sample.dimensions,
                "metric"
            );
        }
        Ok(())
    }
}
