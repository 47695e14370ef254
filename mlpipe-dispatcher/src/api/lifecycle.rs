//! Lifecycle API Handlers
//!
//! Operator-triggered maintenance of the data and artifact buckets.

use axum::{Json, extract::State};
use mlpipe_core::dto::lifecycle::{ProcessRawReport, PruneModels, PruneReport};

use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /lifecycle/process-raw
pub async fn process_raw(State(state): State<AppState>) -> ApiResult<Json<ProcessRawReport>> {
    let report = state
        .lifecycle
        .process_raw()
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to process raw data: {:#}", e)))?;

    tracing::info!(
        "Processed {} raw file(s), {} failed",
        report.processed.len(),
        report.failed.len()
    );

    Ok(Json(report))
}

/// POST /lifecycle/prune-models
pub async fn prune_models(
    State(state): State<AppState>,
    Json(req): Json<PruneModels>,
) -> ApiResult<Json<PruneReport>> {
    let report = state
        .lifecycle
        .prune_models(req.keep)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to prune models: {:#}", e)))?;

    Ok(Json(report))
}
