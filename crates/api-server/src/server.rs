//! API server: mounts the campaign and operational routes over one
//! shared, serialized orchestrator.

use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use campaign_core::config::{ApiConfig, MetricsConfig};
use campaign_pipeline::PipelineOrchestrator;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct ApiServer {
    config: ApiConfig,
    metrics: MetricsConfig,
    orchestrator: Arc<Mutex<PipelineOrchestrator>>,
}

impl ApiServer {
    pub fn new(config: ApiConfig, metrics: MetricsConfig, orchestrator: PipelineOrchestrator) -> Self {
        Self {
            config,
            metrics,
            orchestrator: Arc::new(Mutex::new(orchestrator)),
        }
    }

    /// Routes with middleware, ready to serve.
    pub fn router(&self) -> Router {
        router(AppState {
            orchestrator: self.orchestrator.clone(),
            start_time: Instant::now(),
        })
    }

    /// Start the HTTP server and run until it fails.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let addr = SocketAddr::new(self.config.host.parse()?, self.config.http_port);
        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;

        Ok(())
    }

    /// Install the Prometheus recorder and serve `/metrics` on the metrics
    /// port. Must be called from inside the tokio runtime.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        let addr = SocketAddr::new(self.config.host.parse()?, self.metrics.port);
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;

        info!(port = self.metrics.port, "Metrics exporter started");
        Ok(())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/campaigns", post(rest::run_campaign))
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/live", get(rest::liveness))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campaign_core::AppConfig;
    use campaign_integrations::{GeneratedImage, ImageProvider, ImageRequest, ProviderError};

    struct IdleProvider;

    #[async_trait]
    impl ImageProvider for IdleProvider {
        fn name(&self) -> &str {
            "idle"
        }

        async fn generate(&self, _: &ImageRequest) -> Result<GeneratedImage, ProviderError> {
            Err(ProviderError::Transport("idle".to_string()))
        }
    }

    #[test]
    fn test_start_metrics_rejects_bad_host() {
        let config = AppConfig::default();
        let api = ApiConfig {
            host: "not-an-address".to_string(),
            ..config.api.clone()
        };
        let orchestrator = PipelineOrchestrator::new(&config, Arc::new(IdleProvider));
        let server = ApiServer::new(api, config.metrics.clone(), orchestrator);

        assert!(server.start_metrics().is_err());
    }
}
