//! Trigger intake
//!
//! The path every trigger takes: route, resolve the network, dispatch.

use mlpipe_core::domain::trigger::Trigger;
use mlpipe_core::dto::trigger::{ObjectEventResult, TriggerOutcome, TriggerResponse};
use std::sync::Arc;
use thiserror::Error;

use crate::service::dispatch::{DispatchError, Dispatcher};
use crate::service::network::{NetworkResolver, ResolutionError};
use crate::service::router::{InvalidTriggerError, TriggerRouter};

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("invalid trigger: {0}")]
    InvalidTrigger(#[from] InvalidTriggerError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

pub struct TriggerIntake {
    router: TriggerRouter,
    resolver: Arc<NetworkResolver>,
    dispatcher: Arc<Dispatcher>,
}

impl TriggerIntake {
    pub fn new(
        router: TriggerRouter,
        resolver: Arc<NetworkResolver>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            router,
            resolver,
            dispatcher,
        }
    }

    pub async fn handle(&self, trigger: Trigger) -> Result<TriggerResponse, IntakeError> {
        tracing::debug!("Received {}", trigger);

        let action = match self.router.route(&trigger) {
            Ok(Some(action)) => action,
            Ok(None) => {
                return Ok(TriggerResponse {
                    outcome: TriggerOutcome::Ignored,
                    job: None,
                });
            }
            Err(e) => {
                tracing::warn!("Rejected {}: {}", trigger, e);
                return Err(e.into());
            }
        };

        let network = self.resolver.resolve().await?;
        let outcome = self.dispatcher.dispatch(action, &network).await?;

        Ok(TriggerResponse {
            outcome: if outcome.launched {
                TriggerOutcome::Dispatched
            } else {
                TriggerOutcome::AlreadyActive
            },
            job: Some(outcome.record),
        })
    }

    /// Handles each trigger independently; one failure does not stop the rest
    pub async fn handle_batch(&self, triggers: Vec<Trigger>) -> Vec<ObjectEventResult> {
        let mut results = Vec::with_capacity(triggers.len());

        for trigger in triggers {
            let (bucket, key) = match &trigger {
                Trigger::ObjectCreated { bucket, key, .. } => (bucket.clone(), key.clone()),
                _ => (String::new(), String::new()),
            };

            let result = match self.handle(trigger).await {
                Ok(response) => ObjectEventResult {
                    bucket,
                    key,
                    outcome: Some(response.outcome),
                    job: response.job,
                    error: None,
                },
                Err(e) => ObjectEventResult {
                    bucket,
                    key,
                    outcome: None,
                    job: None,
                    error: Some(e.to_string()),
                },
            };

            results.push(result);
        }

        results
    }
}
