//! Trigger Router
//!
//! Maps each trigger to at most one action. Routing is a pure function of the
//! trigger and static configuration: it never touches the store or the
//! network, so the same trigger always yields the same action.

use mlpipe_core::domain::action::{Action, DatasetRef};
use mlpipe_core::domain::trigger::Trigger;
use thiserror::Error;

/// Direct payload keys
pub const PAYLOAD_ACTION: &str = "action";
pub const PAYLOAD_INPUT_DATA_KEY: &str = "input_data_key";
pub const PAYLOAD_MODEL_KEY: &str = "model_key";
pub const PAYLOAD_OUTPUT_PREFIX: &str = "output_prefix";

pub const TRAIN_MODEL_ACTION: &str = "train_model";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTriggerError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("direct payload has neither `action` nor `input_data_key`")]
    Unroutable,

    #[error("invalid action: {0}")]
    InvalidAction(String),
}

/// Prefix/suffix match on object keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFilter {
    pub prefix: String,
    pub suffix: String,
}

impl KeyFilter {
    pub fn new(prefix: &str, suffix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        key.starts_with(&self.prefix) && key.ends_with(&self.suffix)
    }
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub train_filter: KeyFilter,
    /// Object events routed to batch inference; `None` disables the route
    pub inference_filter: Option<KeyFilter>,
    /// Dataset scheduled and direct training runs against
    pub default_dataset: DatasetRef,
    /// Bucket that direct inference keys are read from
    pub data_bucket: String,
    pub training_instance_type: String,
    pub max_training_secs: u64,
    pub default_model_key: String,
    pub inference_output_prefix: String,
}

pub struct TriggerRouter {
    config: RouterConfig,
}

impl TriggerRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    /// Resolves a trigger to an action
    ///
    /// `Ok(None)` means the trigger was dropped: an object event that matched
    /// no filter.
    pub fn route(&self, trigger: &Trigger) -> Result<Option<Action>, InvalidTriggerError> {
        let action = match trigger {
            Trigger::ObjectCreated { bucket, key, .. } => self.route_object(bucket, key)?,
            Trigger::Scheduled { rule_id, .. } => {
                require("rule_id", rule_id)?;
                Some(self.train_default())
            }
            Trigger::Direct { payload } => {
                let action = payload.get(PAYLOAD_ACTION).map(String::as_str);

                if action == Some(TRAIN_MODEL_ACTION) {
                    Some(self.train_default())
                } else if let Some(input) = payload.get(PAYLOAD_INPUT_DATA_KEY) {
                    require(PAYLOAD_INPUT_DATA_KEY, input)?;
                    Some(self.batch_inference(
                        DatasetRef::new(&self.config.data_bucket, input),
                        payload.get(PAYLOAD_OUTPUT_PREFIX),
                        payload.get(PAYLOAD_MODEL_KEY),
                    ))
                } else if let Some(other) = action {
                    return Err(InvalidTriggerError::UnknownAction(other.to_string()));
                } else {
                    return Err(InvalidTriggerError::Unroutable);
                }
            }
        };

        match &action {
            Some(action) => {
                action.validate().map_err(InvalidTriggerError::InvalidAction)?;
                tracing::debug!("Routed {} to {} job {}", trigger, action.kind(), action.job_id());
            }
            None => tracing::info!("Dropping {}: no filter matched", trigger),
        }

        Ok(action)
    }

    fn route_object(&self, bucket: &str, key: &str) -> Result<Option<Action>, InvalidTriggerError> {
        require("bucket", bucket)?;
        require("key", key)?;

        // Training wins when both filters match
        if self.config.train_filter.matches(key) {
            return Ok(Some(self.train_on(DatasetRef::new(bucket, key))));
        }

        match &self.config.inference_filter {
            Some(filter) if filter.matches(key) => Ok(Some(self.batch_inference(
                DatasetRef::new(bucket, key),
                None,
                None,
            ))),
            _ => Ok(None),
        }
    }

    fn train_default(&self) -> Action {
        self.train_on(self.config.default_dataset.clone())
    }

    fn train_on(&self, dataset_ref: DatasetRef) -> Action {
        Action::TrainModel {
            dataset_ref,
            instance_type: self.config.training_instance_type.clone(),
            max_duration_secs: self.config.max_training_secs,
        }
    }

    fn batch_inference(
        &self,
        input_ref: DatasetRef,
        output_prefix: Option<&String>,
        model_key: Option<&String>,
    ) -> Action {
        Action::RunBatchInference {
            input_ref,
            output_prefix: output_prefix
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(&self.config.inference_output_prefix)
                .clone(),
            model_ref: model_key
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(&self.config.default_model_key)
                .clone(),
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), InvalidTriggerError> {
    if value.trim().is_empty() {
        Err(InvalidTriggerError::MissingField(field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn router() -> TriggerRouter {
        let mut config = Config::default();
        config.data_bucket = "data".to_string();
        TriggerRouter::new(config.router_config())
    }

    fn object(bucket: &str, key: &str) -> Trigger {
        Trigger::ObjectCreated {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: 1024,
        }
    }

    fn direct(pairs: &[(&str, &str)]) -> Trigger {
        Trigger::Direct {
            payload: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_raw_csv_routes_to_training() {
        let action = router().route(&object("data", "raw/input.csv")).unwrap();

        assert_eq!(
            action,
            Some(Action::TrainModel {
                dataset_ref: DatasetRef::new("data", "raw/input.csv"),
                instance_type: "ml.m5.large".to_string(),
                max_duration_secs: 3600,
            })
        );
    }

    #[test]
    fn test_unmatched_object_is_dropped() {
        assert_eq!(router().route(&object("data", "other/ignore.txt")), Ok(None));
        assert_eq!(router().route(&object("data", "raw/notes.txt")), Ok(None));
    }

    #[test]
    fn test_direct_train_model_uses_default_dataset() {
        let action = router()
            .route(&direct(&[("action", "train_model")]))
            .unwrap()
            .unwrap();

        match action {
            Action::TrainModel { dataset_ref, .. } => {
                assert_eq!(dataset_ref, DatasetRef::new("data", "processed/"));
            }
            other => panic!("expected training, got {:?}", other),
        }
    }

    #[test]
    fn test_direct_input_key_routes_to_inference() {
        let action = router()
            .route(&direct(&[("input_data_key", "processed/batch.csv")]))
            .unwrap()
            .unwrap();

        assert_eq!(
            action,
            Action::RunBatchInference {
                input_ref: DatasetRef::new("data", "processed/batch.csv"),
                output_prefix: "processed/predictions/".to_string(),
                model_ref: "models/latest_model.joblib".to_string(),
            }
        );
    }

    #[test]
    fn test_direct_overrides_model_and_output() {
        let action = router()
            .route(&direct(&[
                ("input_data_key", "processed/batch.csv"),
                ("model_key", "models/v2.joblib"),
                ("output_prefix", "processed/v2/"),
            ]))
            .unwrap()
            .unwrap();

        assert!(matches!(
            action,
            Action::RunBatchInference { ref model_ref, ref output_prefix, .. }
                if model_ref == "models/v2.joblib" && output_prefix == "processed/v2/"
        ));
    }

    #[test]
    fn test_train_model_wins_over_input_key() {
        let action = router()
            .route(&direct(&[
                ("action", "train_model"),
                ("input_data_key", "processed/batch.csv"),
            ]))
            .unwrap()
            .unwrap();

        assert!(matches!(action, Action::TrainModel { .. }));
    }

    #[test]
    fn test_invalid_direct_payloads() {
        let router = router();

        assert_eq!(
            router.route(&direct(&[])),
            Err(InvalidTriggerError::Unroutable)
        );
        assert_eq!(
            router.route(&direct(&[("action", "cleanup")])),
            Err(InvalidTriggerError::UnknownAction("cleanup".to_string()))
        );
        assert_eq!(
            router.route(&direct(&[("input_data_key", "  ")])),
            Err(InvalidTriggerError::MissingField("input_data_key"))
        );
    }

    #[test]
    fn test_object_with_missing_fields_is_invalid() {
        assert_eq!(
            router().route(&object("", "raw/input.csv")),
            Err(InvalidTriggerError::MissingField("bucket"))
        );
        assert_eq!(
            router().route(&object("data", "")),
            Err(InvalidTriggerError::MissingField("key"))
        );
    }

    #[test]
    fn test_scheduled_ignores_rule_id() {
        let router = router();
        let a = Trigger::Scheduled {
            rule_id: "nightly".to_string(),
            fired_at: Utc::now(),
        };
        let b = Trigger::Scheduled {
            rule_id: "weekly".to_string(),
            fired_at: Utc::now(),
        };

        let first = router.route(&a).unwrap().unwrap();
        assert_eq!(first, router.route(&b).unwrap().unwrap());
        assert_eq!(first, router.route(&direct(&[("action", "train_model")])).unwrap().unwrap());
    }

    #[test]
    fn test_inference_prefix_routes_object_events() {
        let action = router()
            .route(&object("data", "inference/batch.csv"))
            .unwrap()
            .unwrap();

        assert!(matches!(
            action,
            Action::RunBatchInference { ref input_ref, .. }
                if *input_ref == DatasetRef::new("data", "inference/batch.csv")
        ));
    }

    #[test]
    fn test_inference_object_keeps_event_bucket() {
        let action = router()
            .route(&object("uploads", "inference/batch.csv"))
            .unwrap()
            .unwrap();

        assert!(matches!(
            action,
            Action::RunBatchInference { ref input_ref, .. }
                if *input_ref == DatasetRef::new("uploads", "inference/batch.csv")
        ));
        assert_ne!(
            action.job_id(),
            router()
                .route(&object("data", "inference/batch.csv"))
                .unwrap()
                .unwrap()
                .job_id()
        );
    }

    #[test]
    fn test_training_filter_beats_inference_filter() {
        let mut config = Config::default();
        config.inference_prefix = "raw/".to_string();
        let router = TriggerRouter::new(config.router_config());

        let action = router.route(&object("data", "raw/input.csv")).unwrap().unwrap();
        assert!(matches!(action, Action::TrainModel { .. }));
    }

    #[test]
    fn test_routing_is_deterministic() {
        let router = router();
        let triggers = [
            object("data", "raw/input.csv"),
            object("data", "inference/x.csv"),
            direct(&[("input_data_key", "processed/batch.csv")]),
            direct(&[("action", "train_model")]),
        ];

        for trigger in &triggers {
            let first = router.route(trigger).unwrap().unwrap();
            for _ in 0..10 {
                let again = router.route(trigger).unwrap().unwrap();
                assert_eq!(again, first);
                assert_eq!(again.job_id(), first.job_id());
            }
        }
    }
}
