//! Alarm API Handler

use axum::{Json, extract::State};
use chrono::Utc;
use mlpipe_core::domain::metric::Alarm;

use crate::state::AppState;

/// GET /alarms
/// Current alarm evaluation over the sliding window
pub async fn list_alarms(State(state): State<AppState>) -> Json<Vec<Alarm>> {
    Json(state.monitor.evaluate(Utc::now()))
}
