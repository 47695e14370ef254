//! Artifact lifecycle DTOs

use serde::{Deserialize, Serialize};

/// Server-side copy inside one bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyObject {
    pub source_key: String,
    pub destination_key: String,
}

/// Outcome of promoting raw data files to the processed prefix
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessRawReport {
    pub processed: Vec<ProcessedFile>,
    pub failed: Vec<FailedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub key: String,
    pub processed_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedFile {
    pub key: String,
    pub error: String,
}

/// Request to prune old model artifacts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PruneModels {
    /// Number of most recent models to keep; server default when absent
    pub keep: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PruneReport {
    pub kept: usize,
    pub deleted: Vec<String>,
}
