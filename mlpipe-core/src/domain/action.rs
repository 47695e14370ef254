//! Action domain types
//!
//! An action is the normalized unit of work derived from exactly one trigger.
//! It carries everything needed to launch the job, and its identifying fields
//! determine the job id used for idempotent dispatch.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hex characters of the identity digest kept in a job id
pub const JOB_ID_HASH_LEN: usize = 16;

/// Location of a dataset object (or prefix) in object storage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetRef {
    pub bucket: String,
    pub key: String,
}

impl DatasetRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// `s3://bucket/key` form understood by the compute API
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

/// Concrete work derived from a trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    /// Train a model on a dataset
    TrainModel {
        dataset_ref: DatasetRef,
        instance_type: String,
        max_duration_secs: u64,
    },

    /// Score a batch of input data with a trained model
    RunBatchInference {
        /// Object (or prefix) to score
        input_ref: DatasetRef,
        /// Prefix in the artifacts bucket receiving the predictions
        output_prefix: String,
        /// Key of the model object in the artifacts bucket
        model_ref: String,
    },
}

/// Which family of compute job an action launches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Training,
    Inference,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Training => "training",
            ActionKind::Inference => "inference",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            ActionKind::Training => "train",
            ActionKind::Inference => "infer",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::TrainModel { .. } => ActionKind::Training,
            Action::RunBatchInference { .. } => ActionKind::Inference,
        }
    }

    /// Deterministic job id derived from the identifying fields
    ///
    /// Two actions with bit-identical identifying fields always map to the
    /// same id; this is what makes trigger redelivery safe.
    pub fn job_id(&self) -> String {
        let mut hasher = Sha256::new();
        for field in self.identity_fields() {
            hasher.update(field.as_bytes());
            // Separator keeps ("ab", "c") and ("a", "bc") apart
            hasher.update([0u8]);
        }
        let digest = hex::encode(hasher.finalize());

        format!("{}-{}", self.kind().id_prefix(), &digest[..JOB_ID_HASH_LEN])
    }

    fn identity_fields(&self) -> Vec<String> {
        match self {
            Action::TrainModel {
                dataset_ref,
                instance_type,
                max_duration_secs,
            } => vec![
                self.kind().as_str().to_string(),
                dataset_ref.bucket.clone(),
                dataset_ref.key.clone(),
                instance_type.clone(),
                max_duration_secs.to_string(),
            ],
            Action::RunBatchInference {
                input_ref,
                output_prefix,
                model_ref,
            } => vec![
                self.kind().as_str().to_string(),
                input_ref.bucket.clone(),
                input_ref.key.clone(),
                output_prefix.clone(),
                model_ref.clone(),
            ],
        }
    }

    /// Checks that the action can be turned into a compute job request
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Action::TrainModel {
                dataset_ref,
                instance_type,
                max_duration_secs,
            } => {
                if dataset_ref.bucket.trim().is_empty() {
                    return Err("dataset bucket cannot be empty".to_string());
                }
                if instance_type.trim().is_empty() {
                    return Err("instance type cannot be empty".to_string());
                }
                if *max_duration_secs == 0 {
                    return Err("max duration must be greater than 0".to_string());
                }
            }
            Action::RunBatchInference {
                input_ref,
                output_prefix,
                model_ref,
            } => {
                if input_ref.bucket.trim().is_empty() || input_ref.key.trim().is_empty() {
                    return Err("input reference cannot be empty".to_string());
                }
                if output_prefix.trim().is_empty() {
                    return Err("output prefix cannot be empty".to_string());
                }
                if model_ref.trim().is_empty() {
                    return Err("model reference cannot be empty".to_string());
                }
            }
        }

        Ok(())
    }
}
