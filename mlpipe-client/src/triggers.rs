//! Trigger intake endpoints

use std::collections::BTreeMap;

use mlpipe_core::dto::trigger::{
    ObjectCreatedEvent, ObjectEventEnvelope, ObjectEventResult, ScheduledEvent, TriggerResponse,
};

use crate::error::Result;
use crate::{DispatcherClient, handle_response};

impl DispatcherClient {
    /// Deliver a single object-created event
    pub async fn object_created(&self, event: ObjectCreatedEvent) -> Result<TriggerResponse> {
        let url = format!("{}/trigger/object-created", self.base_url);
        let response = self.client.post(&url).json(&event).send().await?;

        handle_response(response).await
    }

    /// Deliver an object-storage notification envelope
    ///
    /// # Returns
    /// One result per record, in envelope order
    pub async fn object_events(
        &self,
        envelope: &ObjectEventEnvelope,
    ) -> Result<Vec<ObjectEventResult>> {
        let url = format!("{}/trigger/object-events", self.base_url);
        let response = self.client.post(&url).json(envelope).send().await?;

        handle_response(response).await
    }

    /// Fire a schedule rule
    pub async fn scheduled(&self, event: ScheduledEvent) -> Result<TriggerResponse> {
        let url = format!("{}/trigger/scheduled", self.base_url);
        let response = self.client.post(&url).json(&event).send().await?;

        handle_response(response).await
    }

    /// Invoke the dispatcher directly with a string-keyed payload
    ///
    /// Recognized keys are `action`, `input_data_key`, `model_key` and
    /// `output_prefix`.
    pub async fn direct(&self, payload: &BTreeMap<String, String>) -> Result<TriggerResponse> {
        let url = format!("{}/trigger/direct", self.base_url);
        let response = self.client.post(&url).json(payload).send().await?;

        handle_response(response).await
    }
}
