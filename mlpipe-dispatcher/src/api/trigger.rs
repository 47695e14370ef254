//! Trigger API Handlers
//!
//! Entry points for object-storage events, schedule firings and direct
//! invocations. Every trigger goes through the same intake path.

use axum::{Json, extract::State};
use chrono::Utc;
use mlpipe_core::domain::trigger::Trigger;
use mlpipe_core::dto::trigger::{
    ObjectCreatedEvent, ObjectEventEnvelope, ObjectEventResult, ScheduledEvent, TriggerResponse,
};
use std::collections::BTreeMap;

use crate::api::error::ApiResult;
use crate::state::AppState;

/// POST /trigger/object-created
pub async fn object_created(
    State(state): State<AppState>,
    Json(event): Json<ObjectCreatedEvent>,
) -> ApiResult<Json<TriggerResponse>> {
    let response = state.intake.handle(event.into()).await?;
    Ok(Json(response))
}

/// POST /trigger/object-events
/// Notification envelope; each record is handled independently
pub async fn object_events(
    State(state): State<AppState>,
    Json(envelope): Json<ObjectEventEnvelope>,
) -> Json<Vec<ObjectEventResult>> {
    let triggers = envelope.into_triggers();
    tracing::debug!("Received notification with {} record(s)", triggers.len());

    Json(state.intake.handle_batch(triggers).await)
}

/// POST /trigger/scheduled
pub async fn scheduled(
    State(state): State<AppState>,
    Json(event): Json<ScheduledEvent>,
) -> ApiResult<Json<TriggerResponse>> {
    let trigger = Trigger::Scheduled {
        rule_id: event.rule_id,
        fired_at: event.fired_at.unwrap_or_else(Utc::now),
    };

    let response = state.intake.handle(trigger).await?;
    Ok(Json(response))
}

/// POST /trigger/direct
pub async fn direct(
    State(state): State<AppState>,
    Json(payload): Json<BTreeMap<String, String>>,
) -> ApiResult<Json<TriggerResponse>> {
    let response = state.intake.handle(Trigger::Direct { payload }).await?;
    Ok(Json(response))
}
