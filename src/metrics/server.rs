//! HTTP exporter for the generator's metrics.
//!
//! `/metrics` serves the Prometheus text encoding. `/health` reports the
//! generator phase: `200` once words are flowing, `503` while the sources
//! are still uninitialized or calibrating.

use crate::generator::GeneratorState;
use crate::metrics::MetricsRegistry;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tower_http::cors::CorsLayer;

/// Default exporter port.
pub const DEFAULT_PORT: u16 = 9090;

/// Metrics exporter failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Listener or runtime setup failed.
    #[error("metrics exporter I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP server stopped with an error.
    #[error("metrics exporter stopped: {0}")]
    Serve(String),
}

/// Where the exporter listens. Loopback only.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Socket address to bind.
    pub bind_addr: SocketAddr,
}

impl MetricsServerConfig {
    /// Listens on `127.0.0.1:port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], port)),
        }
    }
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(DEFAULT_PORT)
    }
}

/// Serves a shared [`MetricsRegistry`] while the generator updates it.
pub struct MetricsServer {
    config: MetricsServerConfig,
    registry: Arc<MetricsRegistry>,
}

impl MetricsServer {
    /// Creates a server exposing `registry`.
    pub fn new(config: MetricsServerConfig, registry: Arc<MetricsRegistry>) -> Self {
        Self { config, registry }
    }

    fn router(registry: Arc<MetricsRegistry>) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(registry)
    }

    /// Serves requests until the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Metrics exporter listening");

        axum::serve(listener, Self::router(self.registry))
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))
    }

    /// Runs the exporter on its own thread with a single-worker runtime,
    /// leaving the extraction loop synchronous.
    pub fn spawn(self) -> JoinHandle<Result<(), ServerError>> {
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()?;
            let result = runtime.block_on(self.run());
            if let Err(e) = &result {
                tracing::warn!(error = %e, "Metrics exporter exited");
            }
            result
        })
    }
}

async fn metrics_handler(State(registry): State<Arc<MetricsRegistry>>) -> impl IntoResponse {
    match registry.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            e.to_string(),
        ),
    }
}

async fn health_handler(State(registry): State<Arc<MetricsRegistry>>) -> impl IntoResponse {
    health_report(&registry)
}

fn health_report(registry: &MetricsRegistry) -> (StatusCode, String) {
    let state = registry.state();
    let status = match state {
        GeneratorState::Running => StatusCode::OK,
        GeneratorState::Uninitialized | GeneratorState::Calibrating => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, format!("{state} words={}\n", registry.words()))
}
