//! Network repository
//!
//! Reads the network inventory (networks, subnets and their tags) the
//! resolver chooses from.

use anyhow::{Context, Result};
use async_trait::async_trait;
use mlpipe_client::CloudClient;
use mlpipe_core::domain::network::Network;

#[async_trait]
pub trait NetworkRepository: Send + Sync {
    async fn list_networks(&self) -> Result<Vec<Network>>;
}

/// HTTP implementation of NetworkRepository
pub struct HttpNetworkRepository {
    client: CloudClient,
}

impl HttpNetworkRepository {
    pub fn new(network_api_url: &str) -> Self {
        Self {
            client: CloudClient::new(network_api_url),
        }
    }
}

#[async_trait]
impl NetworkRepository for HttpNetworkRepository {
    async fn list_networks(&self) -> Result<Vec<Network>> {
        self.client
            .list_networks()
            .await
            .context("Failed to fetch network inventory")
    }
}
