//! # Metrics Server
//!
//! Prometheus counters for processed deltas and a small axum server that
//! exposes them.
//!
//! ## Endpoints
//!
//! - `GET /metrics` - Prometheus text format
//! - `GET /health` - Health check

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use doccache_core::DoccacheError;
use prometheus::{
    IntCounter, IntGauge, Opts, Registry, TextEncoder, register_int_counter_with_registry,
    register_int_gauge_with_registry,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// =============================================================================
// COUNTERS
// =============================================================================

/// Delta processing metrics.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub created_docs: IntCounter,
    pub created_edges: IntCounter,
    pub deleted_docs: IntCounter,
    pub deleted_edges: IntCounter,
    pub block_number: IntGauge,
}

fn metric_error(e: prometheus::Error) -> DoccacheError {
    DoccacheError::IoError(format!("metrics: {e}"))
}

impl Metrics {
    /// Register all metrics in a fresh registry.
    pub fn new() -> Result<Self, DoccacheError> {
        let registry = Registry::new();
        let counter = |name: &str, help: &str| {
            register_int_counter_with_registry!(Opts::new(name, help), registry).map_err(metric_error)
        };
        Ok(Self {
            created_docs: counter("created_docs", "Documents stored")?,
            created_edges: counter("created_edges", "Edges added")?,
            deleted_docs: counter("deleted_docs", "Documents deleted")?,
            deleted_edges: counter("deleted_edges", "Edges removed")?,
            block_number: register_int_gauge_with_registry!(
                Opts::new("block_number", "Block of the last processed event"),
                registry
            )
            .map_err(metric_error)?,
            registry,
        })
    }

    /// Render every metric in the Prometheus text format.
    pub fn render(&self) -> Result<String, DoccacheError> {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .map_err(metric_error)
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Prometheus scrape endpoint.
pub async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    match metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Metrics encoding failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Create the metrics router.
pub fn create_router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(metrics)
}

/// Serve the metrics router on `0.0.0.0:{port}`.
pub async fn run_server(port: u16, metrics: Arc<Metrics>) -> Result<(), DoccacheError> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DoccacheError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Metrics server listening on {}", addr);

    axum::serve(listener, create_router(metrics))
        .await
        .map_err(|e| DoccacheError::IoError(format!("Server error: {}", e)))
}
