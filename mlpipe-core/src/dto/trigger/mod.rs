//! Trigger DTOs
//!
//! Wire shapes accepted by the dispatcher's trigger endpoints, and the
//! object-storage notification envelope that batches several object events.

use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::domain::job::JobRecord;
use crate::domain::trigger::Trigger;

/// Single object-created event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectCreatedEvent {
    pub bucket: String,
    pub key: String,
    #[serde(default)]
    pub size: u64,
}

impl From<ObjectCreatedEvent> for Trigger {
    fn from(event: ObjectCreatedEvent) -> Self {
        Trigger::ObjectCreated {
            bucket: event.bucket,
            key: event.key,
            size: event.size,
        }
    }
}

/// Schedule firing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub rule_id: String,
    /// Defaults to the time the dispatcher received the event
    pub fired_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Object storage notification envelope
// =============================================================================

/// `{"Records": [...]}` notification as delivered by object storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEventEnvelope {
    #[serde(rename = "Records", default)]
    pub records: Vec<ObjectEventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Object {
    pub key: String,
    #[serde(default)]
    pub size: u64,
}

impl ObjectEventEnvelope {
    /// One trigger per record, with object keys URL-decoded
    pub fn into_triggers(self) -> Vec<Trigger> {
        self.records
            .into_iter()
            .map(|record| Trigger::ObjectCreated {
                bucket: record.s3.bucket.name,
                key: decode_object_key(&record.s3.object.key),
                size: record.s3.object.size,
            })
            .collect()
    }
}

/// Decodes a notification object key (`+` is a space, `%XX` an escaped byte)
///
/// Malformed escapes are kept verbatim.
pub fn decode_object_key(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

// =============================================================================
// Responses
// =============================================================================

/// What happened to one trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerOutcome {
    /// A new job was launched
    Dispatched,
    /// A job with the same id is already in flight; nothing was launched
    AlreadyActive,
    /// The trigger did not match any filter
    Ignored,
}

/// Response to a trigger invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub outcome: TriggerOutcome,
    pub job: Option<JobRecord>,
}

/// Per-record result for a notification envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEventResult {
    pub bucket: String,
    pub key: String,
    pub outcome: Option<TriggerOutcome>,
    pub job: Option<JobRecord>,
    pub error: Option<String>,
}
