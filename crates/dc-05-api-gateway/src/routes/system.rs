//! Liveness, metrics and protocol version discovery.

use super::AppState;
use crate::ApiError;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use shared_types::{DSP_CONTEXT, DSP_PROTOCOL_VERSION};

pub fn routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
}

pub fn protocol_routes() -> Router<AppState> {
    Router::new().route("/.well-known/dspace-version", get(dspace_version))
}

/// Supported protocol versions, each served under this connector's endpoint.
async fn dspace_version(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "@context": DSP_CONTEXT,
        "protocolVersions": [{
            "version": DSP_PROTOCOL_VERSION,
            "path": state.self_endpoint,
        }],
    }))
}

/// Health check handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "dataspace-connector",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let body = connector_telemetry::encode_metrics().map_err(|e| ApiError::internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
