//! API Module
//!
//! HTTP API layer for the dispatcher.
//! Each submodule handles endpoints for a specific domain.

pub mod alarm;
pub mod error;
pub mod health;
pub mod job;
pub mod lifecycle;
pub mod trigger;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Trigger endpoints
        .route("/trigger/object-created", post(trigger::object_created))
        .route("/trigger/object-events", post(trigger::object_events))
        .route("/trigger/scheduled", post(trigger::scheduled))
        .route("/trigger/direct", post(trigger::direct))
        // Job endpoints
        .route("/job/list", get(job::list_jobs))
        .route("/job/{id}", get(job::get_job))
        .route("/job/{id}/complete", post(job::complete_job))
        // Monitoring and maintenance
        .route("/alarms", get(alarm::list_alarms))
        .route("/lifecycle/process-raw", post(lifecycle::process_raw))
        .route("/lifecycle/prune-models", post(lifecycle::prune_models))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use mlpipe_core::domain::metric::{JOB_DURATION, JOB_SUCCEEDED, TRAINING_JOB_STARTED};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let ctx = TestContext::new();
        let response = create_router(ctx.state)
            .oneshot(get("/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_object_created_dispatches_training() {
        let ctx = TestContext::new();
        let app = create_router(ctx.state.clone());

        let (status, body) = send(
            app,
            post_json(
                "/trigger/object-created",
                json!({"bucket": "data", "key": "raw/input.csv", "size": 10}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "Dispatched");
        assert_eq!(body["job"]["status"], "Running");
        assert_eq!(ctx.compute.submissions().len(), 1);
        assert_eq!(ctx.metrics.names(), vec![TRAINING_JOB_STARTED.to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_direct_payload_is_bad_request() {
        let ctx = TestContext::new();

        let (status, body) = send(
            create_router(ctx.state),
            post_json("/trigger/direct", json!({"action": "delete_everything"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("delete_everything"));
    }

    #[tokio::test]
    async fn test_direct_inference_uses_defaults() {
        let ctx = TestContext::new();

        let (status, body) = send(
            create_router(ctx.state),
            post_json("/trigger/direct", json!({"input_data_key": "inference/batch.csv"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["job"]["action"]["input_ref"],
            json!({"bucket": "data", "key": "inference/batch.csv"})
        );
        assert_eq!(
            body["job"]["action"]["output_prefix"],
            "processed/predictions/"
        );
        assert_eq!(
            body["job"]["action"]["model_ref"],
            "models/latest_model.joblib"
        );
    }

    #[tokio::test]
    async fn test_scheduled_trigger_trains_default_dataset() {
        let ctx = TestContext::new();

        let (status, body) = send(
            create_router(ctx.state),
            post_json(
                "/trigger/scheduled",
                json!({"rule_id": "nightly", "fired_at": Utc::now()}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["job"]["action"]["type"], "TrainModel");
        assert_eq!(body["job"]["action"]["dataset_ref"]["key"], "processed/");
    }

    #[tokio::test]
    async fn test_object_events_envelope() {
        let ctx = TestContext::new();
        let envelope = json!({
            "Records": [
                {"s3": {"bucket": {"name": "data"}, "object": {"key": "raw/a.csv", "size": 1}}},
                {"s3": {"bucket": {"name": "data"}, "object": {"key": "notes/readme.md"}}}
            ]
        });

        let (status, body) = send(
            create_router(ctx.state),
            post_json("/trigger/object-events", envelope),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["outcome"], "Dispatched");
        assert_eq!(body[1]["outcome"], "Ignored");
    }

    #[tokio::test]
    async fn test_job_completion_flow() {
        let ctx = TestContext::new();
        let app = create_router(ctx.state.clone());

        let (_, body) = send(
            app.clone(),
            post_json(
                "/trigger/object-created",
                json!({"bucket": "data", "key": "raw/input.csv"}),
            ),
        )
        .await;
        let job_id = body["job"]["job_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            app.clone(),
            post_json(
                &format!("/job/{}/complete", job_id),
                json!({"attempt": 1, "status": "Succeeded"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Succeeded");
        assert_eq!(
            ctx.metrics.names(),
            vec![
                TRAINING_JOB_STARTED.to_string(),
                JOB_SUCCEEDED.to_string(),
                JOB_DURATION.to_string()
            ]
        );

        let (status, _) = send(
            app.clone(),
            post_json(
                &format!("/job/{}/complete", job_id),
                json!({"attempt": 1, "status": "Failed"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(app, get("/job/list?status=Succeeded")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_completion_for_other_attempt_conflicts() {
        let ctx = TestContext::new();
        let app = create_router(ctx.state.clone());

        let (_, body) = send(
            app.clone(),
            post_json(
                "/trigger/object-created",
                json!({"bucket": "data", "key": "raw/input.csv"}),
            ),
        )
        .await;
        let job_id = body["job"]["job_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            app.clone(),
            post_json(
                &format!("/job/{}/complete", job_id),
                json!({"attempt": 2, "status": "Succeeded"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("attempt"));

        let (_, body) = send(app, get(&format!("/job/{}", job_id))).await;
        assert_eq!(body["status"], "Running");
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let ctx = TestContext::new();

        let (status, _) = send(create_router(ctx.state), get("/job/train-0000000000000000")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_alarms_start_clear() {
        let ctx = TestContext::new();

        let (status, body) = send(create_router(ctx.state), get("/alarms")).await;

        assert_eq!(status, StatusCode::OK);
        let alarms = body.as_array().unwrap();
        assert_eq!(alarms.len(), 2);
        assert!(alarms.iter().all(|a| a["status"] == "Ok"));
    }

    #[tokio::test]
    async fn test_lifecycle_endpoints() {
        let ctx = TestContext::new();
        ctx.artifacts.put("data", "raw/a.csv", 10, Utc::now());
        ctx.artifacts
            .put("artifacts", "models/old.joblib", 1, Utc::now() - chrono::Duration::days(1));
        ctx.artifacts.put("artifacts", "models/new.joblib", 1, Utc::now());
        let app = create_router(ctx.state.clone());

        let (status, body) = send(app.clone(), post_json("/lifecycle/process-raw", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["processed"][0]["processed_key"], "processed/a.csv");

        let (status, body) = send(app, post_json("/lifecycle/prune-models", json!({"keep": 1}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], json!(["models/old.joblib"]));
        assert!(ctx.artifacts.contains("artifacts", "models/new.joblib"));
    }
}
