//! Cloud inventory and monitoring client
//!
//! Lists the execution networks visible to the account and publishes metric
//! samples to the monitoring backend.

use mlpipe_core::domain::metric::MetricSample;
use mlpipe_core::domain::network::Network;
use reqwest::Client;

use crate::error::Result;
use crate::{handle_empty_response, handle_response, normalize_base_url};

/// HTTP client for the cloud inventory and metrics API
#[derive(Debug, Clone)]
pub struct CloudClient {
    base_url: String,
    client: Client,
}

impl CloudClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All networks (with subnets and security groups) in the account/region
    pub async fn list_networks(&self) -> Result<Vec<Network>> {
        let url = format!("{}/networks", self.base_url);
        let response = self.client.get(&url).send().await?;

        handle_response(response).await
    }

    /// Publish a batch of metric samples
    pub async fn put_metric_data(&self, samples: &[MetricSample]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let url = format!("{}/metrics", self.base_url);
        let response = self.client.post(&url).json(samples).send().await?;

        handle_empty_response(response).await
    }
}
