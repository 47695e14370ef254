//! Artifact & Data Lifecycle
//!
//! Maintenance over the data and artifact buckets: promoting raw data files
//! to the processed prefix, and pruning old model artifacts. Storage-tier
//! transitions stay with the object store.

use anyhow::Result;
use mlpipe_core::domain::artifact::{MODELS_PREFIX, RAW_PREFIX, processed_key_for};
use mlpipe_core::dto::lifecycle::{FailedFile, ProcessRawReport, ProcessedFile, PruneReport};
use std::sync::Arc;

use crate::repository::ArtifactRepository;
use crate::service::monitoring::Monitor;

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub data_bucket: String,
    pub artifacts_bucket: String,
    /// Suffix a raw object needs to count as a data file
    pub data_suffix: String,
    pub model_retention_count: usize,
}

pub struct LifecycleService {
    artifacts: Arc<dyn ArtifactRepository>,
    monitor: Arc<Monitor>,
    settings: LifecycleSettings,
}

impl LifecycleService {
    pub fn new(
        artifacts: Arc<dyn ArtifactRepository>,
        monitor: Arc<Monitor>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            artifacts,
            monitor,
            settings,
        }
    }

    /// Copies every raw data file to the same key under the processed prefix
    ///
    /// A failing file is reported and does not stop the batch.
    pub async fn process_raw(&self) -> Result<ProcessRawReport> {
        let bucket = &self.settings.data_bucket;
        let objects = self.artifacts.list_objects(bucket, RAW_PREFIX).await?;

        let mut report = ProcessRawReport::default();

        for object in objects
            .into_iter()
            .filter(|o| o.key.ends_with(&self.settings.data_suffix))
        {
            let Some(processed_key) = processed_key_for(&object.key) else {
                continue;
            };

            if object.size == 0 {
                tracing::warn!("Skipping empty data file {}", object.key);
                report.failed.push(FailedFile {
                    key: object.key,
                    error: "empty file".to_string(),
                });
                continue;
            }

            match self
                .artifacts
                .copy_object(bucket, &object.key, &processed_key)
                .await
            {
                Ok(()) => {
                    tracing::info!("Processed data file {} -> {}", object.key, processed_key);
                    self.monitor.data_file_processed(&object.key).await;
                    report.processed.push(ProcessedFile {
                        key: object.key,
                        processed_key,
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to process {}: {:#}", object.key, e);
                    report.failed.push(FailedFile {
                        key: object.key,
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Deletes all but the `keep` most recently modified model artifacts
    pub async fn prune_models(&self, keep: Option<usize>) -> Result<PruneReport> {
        let keep = keep.unwrap_or(self.settings.model_retention_count);
        let bucket = &self.settings.artifacts_bucket;

        let mut models = self.artifacts.list_objects(bucket, MODELS_PREFIX).await?;
        models.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| b.key.cmp(&a.key))
        });

        let kept = models.len().min(keep);
        let mut deleted = Vec::new();

        for model in models.into_iter().skip(keep) {
            self.artifacts.delete_object(bucket, &model.key).await?;
            tracing::info!("Deleted old model {}", model.key);
            deleted.push(model.key);
        }

        Ok(PruneReport { kept, deleted })
    }
}
