//! Job API Handlers
//!
//! HTTP endpoints for job queries and completion reports.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use mlpipe_core::domain::job::JobRecord;
use mlpipe_core::dto::job::{CompleteJob, JobListQuery};

use crate::api::error::ApiResult;
use crate::state::AppState;

/// GET /job/list
/// List job records, most recent first
///
/// Query parameters:
/// - `status` (optional): only records in this status
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> ApiResult<Json<Vec<JobRecord>>> {
    tracing::debug!("Listing jobs (status: {:?})", query.status);

    let jobs = state.jobs.list_jobs(query.status).await?;
    Ok(Json(jobs))
}

/// GET /job/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobRecord>> {
    tracing::debug!("Getting job: {}", job_id);

    let job = state.jobs.get_job(&job_id).await?;
    Ok(Json(job))
}

/// POST /job/{id}/complete
/// Terminal status report from the compute service
pub async fn complete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(report): Json<CompleteJob>,
) -> ApiResult<Json<JobRecord>> {
    tracing::info!("Completing job {} with status {}", job_id, report.status);

    let job = state.jobs.complete_job(&job_id, report).await?;
    Ok(Json(job))
}
