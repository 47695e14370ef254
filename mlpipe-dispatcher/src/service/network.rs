//! Network Resource Resolver
//!
//! Picks the network and subnets jobs run in. The choice is made once per
//! process and cached; a failure here is fatal at startup.
//!
//! Fallback order, first non-empty candidate wins:
//! 1. private-tier subnets of the preferred network
//! 2. public-tier subnets of the preferred network
//! 3. any subnets of the preferred network
//! 4. the account default network

use mlpipe_core::domain::network::{
    Network, NetworkResolution, ResolutionSource, Subnet, SubnetTier,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::repository::NetworkRepository;

#[derive(Debug, Clone, Error)]
pub enum ResolutionError {
    #[error("failed to read network inventory: {0}")]
    Inventory(String),

    #[error("no usable network: {0}")]
    NoUsableNetwork(String),
}

#[derive(Debug, Clone, Default)]
pub struct ResolverSettings {
    /// Network to prefer; the first non-default network by id when unset
    pub preferred_network_id: Option<String>,
    /// Subnet tag holding the tier (`private` / `public`)
    pub subnet_tier_tag: String,
}

type SubnetPredicate = fn(&Subnet, &str) -> bool;

fn is_private(subnet: &Subnet, tier_tag: &str) -> bool {
    subnet.tier(tier_tag) == Some(SubnetTier::Private)
}

fn is_public(subnet: &Subnet, tier_tag: &str) -> bool {
    subnet.tier(tier_tag) == Some(SubnetTier::Public)
}

fn any_subnet(_: &Subnet, _: &str) -> bool {
    true
}

/// Candidates tried against the preferred network, in order
const PREFERRED_CHAIN: [(ResolutionSource, SubnetPredicate); 3] = [
    (ResolutionSource::PreferredPrivate, is_private),
    (ResolutionSource::PreferredPublic, is_public),
    (ResolutionSource::AnyExisting, any_subnet),
];

pub struct NetworkResolver {
    repository: Arc<dyn NetworkRepository>,
    settings: ResolverSettings,
    resolved: OnceCell<NetworkResolution>,
}

impl NetworkResolver {
    pub fn new(repository: Arc<dyn NetworkRepository>, settings: ResolverSettings) -> Self {
        Self {
            repository,
            settings,
            resolved: OnceCell::new(),
        }
    }

    /// Returns the cached resolution, computing it on first use
    pub async fn resolve(&self) -> Result<NetworkResolution, ResolutionError> {
        self.resolved
            .get_or_try_init(|| async {
                let networks = self
                    .repository
                    .list_networks()
                    .await
                    .map_err(|e| ResolutionError::Inventory(format!("{:#}", e)))?;

                let resolution = select(&networks, &self.settings)?;

                tracing::info!(
                    "Resolved network {} ({}) with {} subnet(s)",
                    resolution.network_id,
                    resolution.source,
                    resolution.subnet_ids.len()
                );

                Ok::<_, ResolutionError>(resolution)
            })
            .await
            .cloned()
    }
}

/// Applies the fallback chain to an inventory snapshot
pub fn select(
    networks: &[Network],
    settings: &ResolverSettings,
) -> Result<NetworkResolution, ResolutionError> {
    if let Some(preferred) = preferred_network(networks, settings) {
        for (source, predicate) in PREFERRED_CHAIN {
            let subnets: Vec<&Subnet> = preferred
                .subnets
                .iter()
                .filter(|s| predicate(s, &settings.subnet_tier_tag))
                .collect();

            if !subnets.is_empty() {
                return Ok(resolution(preferred, subnets, source));
            }
        }

        tracing::warn!(
            "Network {} has no subnets, falling back to the default network",
            preferred.id
        );
    }

    let default = networks.iter().find(|n| n.is_default).ok_or_else(|| {
        ResolutionError::NoUsableNetwork(format!(
            "{} network(s) in inventory, none with subnets and no default network",
            networks.len()
        ))
    })?;

    if default.subnets.is_empty() {
        return Err(ResolutionError::NoUsableNetwork(format!(
            "default network {} has no subnets",
            default.id
        )));
    }

    Ok(resolution(
        default,
        default.subnets.iter().collect(),
        ResolutionSource::Default,
    ))
}

fn preferred_network<'a>(networks: &'a [Network], settings: &ResolverSettings) -> Option<&'a Network> {
    let mut candidates: Vec<&Network> = networks.iter().filter(|n| !n.is_default).collect();
    candidates.sort_by(|a, b| a.id.cmp(&b.id));

    if let Some(id) = &settings.preferred_network_id {
        match candidates.iter().find(|n| &n.id == id) {
            Some(network) => return Some(*network),
            None => tracing::warn!("Preferred network {} not found in inventory", id),
        }
    }

    candidates.first().copied()
}

fn resolution(network: &Network, subnets: Vec<&Subnet>, source: ResolutionSource) -> NetworkResolution {
    let mut subnet_ids: Vec<String> = subnets.into_iter().map(|s| s.id.clone()).collect();
    subnet_ids.sort();

    NetworkResolution {
        network_id: network.id.clone(),
        subnet_ids,
        security_group_ids: network.security_group_ids.clone(),
        source,
    }
}
