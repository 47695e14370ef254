//! Artifact store conventions
//!
//! Prefix layout shared by the data and artifact buckets. The external store
//! applies its storage-tier transitions to these prefixes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const RAW_PREFIX: &str = "raw/";
pub const PROCESSED_PREFIX: &str = "processed/";
pub const MODELS_PREFIX: &str = "models/";

/// Listing entry for an object in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Key a raw object is promoted to once processed
///
/// Returns `None` for keys outside the raw prefix.
pub fn processed_key_for(raw_key: &str) -> Option<String> {
    raw_key
        .strip_prefix(RAW_PREFIX)
        .map(|rest| format!("{}{}", PROCESSED_PREFIX, rest))
}
