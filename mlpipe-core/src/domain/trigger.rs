//! Trigger domain types
//!
//! A trigger is the raw external event that may cause an action to run.
//! It is created once per invocation and discarded after routing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An external event or request handed to the router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Trigger {
    /// An object landed in a watched bucket
    ObjectCreated {
        bucket: String,
        key: String,
        size: u64,
    },

    /// A periodic schedule fired
    Scheduled {
        rule_id: String,
        fired_at: DateTime<Utc>,
    },

    /// A caller invoked the dispatcher directly
    Direct { payload: BTreeMap<String, String> },
}

impl Trigger {
    /// Short label used in logs and metric dimensions
    pub fn kind(&self) -> &'static str {
        match self {
            Trigger::ObjectCreated { .. } => "object_created",
            Trigger::Scheduled { .. } => "scheduled",
            Trigger::Direct { .. } => "direct",
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::ObjectCreated { bucket, key, size } => {
                write!(f, "object-created s3://{}/{} ({} bytes)", bucket, key, size)
            }
            Trigger::Scheduled { rule_id, fired_at } => {
                write!(f, "scheduled {} at {}", rule_id, fired_at.to_rfc3339())
            }
            Trigger::Direct { payload } => {
                let keys: Vec<&str> = payload.keys().map(String::as_str).collect();
                write!(f, "direct [{}]", keys.join(", "))
            }
        }
    }
}
