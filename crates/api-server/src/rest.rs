//! REST handlers for campaign runs and operational endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use campaign_core::{BriefInput, CampaignBrief, RunResult};
use campaign_pipeline::PipelineOrchestrator;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Shared application state for REST handlers.
///
/// Runs hold the orchestrator lock for their whole duration, so concurrent
/// requests queue instead of multiplying provider traffic.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Mutex<PipelineOrchestrator>>,
    pub start_time: Instant,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

/// POST /v1/campaigns: run the pipeline for one brief.
pub async fn run_campaign(
    State(state): State<AppState>,
    body: Result<Json<BriefInput>, JsonRejection>,
) -> Result<Json<RunResult>, ApiError> {
    let brief = body
        .map_err(|e| e.body_text())
        .and_then(|Json(input)| CampaignBrief::try_from(input).map_err(|e| e.to_string()))
        .map_err(|msg| {
            warn!(error = %msg, "Brief validation failed");
            metrics::counter!("api.validation_errors").increment(1);
            api_error(StatusCode::BAD_REQUEST, "invalid_brief", msg)
        })?;

    let orchestrator = state.orchestrator.lock().await;
    info!(products = brief.products().len(), "Running campaign brief");

    match orchestrator.run_brief(&brief).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            error!(error = %e, "Campaign run failed");
            metrics::counter!("api.errors").increment(1);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "run_failed",
                e.to_string(),
            ))
        }
    }
}

/// GET /health: Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /live: Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use campaign_core::AppConfig;
    use campaign_integrations::{GeneratedImage, ImageProvider, ImageRequest, ProviderError};
    use tower::ServiceExt;

    /// Always refuses; the tests only use briefs whose assets exist.
    struct UnreachableProvider;

    #[async_trait]
    impl ImageProvider for UnreachableProvider {
        fn name(&self) -> &str {
            "unreachable"
        }

        async fn generate(&self, _: &ImageRequest) -> Result<GeneratedImage, ProviderError> {
            Err(ProviderError::Transport("offline".to_string()))
        }
    }

    fn state(root: &std::path::Path) -> AppState {
        let mut config = AppConfig::default();
        config.paths.assets_dir = root.join("assets");
        config.paths.output_dir = root.join("outputs");
        std::fs::create_dir_all(&config.paths.assets_dir).unwrap();
        image::RgbImage::new(48, 48)
            .save(config.paths.assets_dir.join("tote.png"))
            .unwrap();

        AppState {
            orchestrator: Arc::new(Mutex::new(PipelineOrchestrator::new(
                &config,
                Arc::new(UnreachableProvider),
            ))),
            start_time: Instant::now(),
        }
    }

    async fn post_json(app: axum::Router, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::post("/v1/campaigns")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_liveness_and_health() {
        let tmp = tempfile::tempdir().unwrap();
        let app = router(state(tmp.path()));

        let live = app
            .clone()
            .oneshot(Request::get("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(live.status(), StatusCode::OK);

        let health = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(health.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "healthy");
        assert!(json["uptime_secs"].is_u64());
    }

    #[tokio::test]
    async fn test_invalid_brief_is_400() {
        let tmp = tempfile::tempdir().unwrap();
        let app = router(state(tmp.path()));

        let (status, json) = post_json(app.clone(), r#"{"products": [], "message": "Hi"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_brief");

        let (status, json) = post_json(app, r#"{"products": "not a list"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_brief");
    }

    #[tokio::test]
    async fn test_run_campaign_returns_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let app = router(state(tmp.path()));

        let (status, json) = post_json(app, r#"{"products": ["tote"], "message": "Carry more"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["products"][0], "tote");
        assert_eq!(json["generated_count"], 0);
        assert_eq!(json["processed_count"], 1);
        assert_eq!(json["total_assets"], 3);
        assert!(tmp.path().join("outputs/tote/square_1080x1080.png").is_file());
    }
}
