//! Network domain model
//!
//! Execution networks as reported by the cloud inventory, and the resolved
//! network a job runner is bound to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A subnet inside an execution network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Subnet {
    /// Tier of this subnet according to the given tag key
    ///
    /// Tag values are compared case-insensitively.
    pub fn tier(&self, tier_tag: &str) -> Option<SubnetTier> {
        let value = self.tags.get(tier_tag)?;
        if value.eq_ignore_ascii_case("private") {
            Some(SubnetTier::Private)
        } else if value.eq_ignore_ascii_case("public") {
            Some(SubnetTier::Public)
        } else {
            None
        }
    }
}

/// Isolation tier a subnet is tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubnetTier {
    Private,
    Public,
}

/// An execution network (a set of subnets and a security boundary)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,

    /// Whether this is the account's default network
    #[serde(default)]
    pub is_default: bool,

    #[serde(default)]
    pub subnets: Vec<Subnet>,

    #[serde(default)]
    pub security_group_ids: Vec<String>,
}

/// Which rung of the fallback chain produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionSource {
    PreferredPrivate,
    PreferredPublic,
    AnyExisting,
    Default,
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionSource::PreferredPrivate => write!(f, "PreferredPrivate"),
            ResolutionSource::PreferredPublic => write!(f, "PreferredPublic"),
            ResolutionSource::AnyExisting => write!(f, "AnyExisting"),
            ResolutionSource::Default => write!(f, "Default"),
        }
    }
}

/// The network jobs are launched into
///
/// Resolved once per process and reused for every dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkResolution {
    pub network_id: String,
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
    pub source: ResolutionSource,
}
