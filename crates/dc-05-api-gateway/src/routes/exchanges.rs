//! Private data exchange API.
//!
//! Operator and peer calls sit behind the bearer token. The sync endpoint is
//! guarded by the exchange key instead, since peers only hold that.

use super::{AppState, JsonBody};
use crate::middleware::ExchangeKey;
use crate::ApiError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use dc_04_data_exchange::{DataExchange, DataExchangeSnapshot, NewDataExchange};
use serde::Deserialize;
use tracing::info;

type ExchangeResponse = Result<Json<DataExchange>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EndpointBody {
    pub endpoint: String,
}

/// Routes requiring the private bearer token.
pub fn private_routes() -> Router<AppState> {
    Router::new()
        .route("/private/dataexchanges", post(create_mirror))
        .route("/private/dataexchanges/initiate", post(initiate))
        .route("/private/dataexchanges/:id", get(get_exchange))
        .route("/private/dataexchanges/:id/status", put(update_status))
        .route("/private/dataexchanges/:id/sync", post(sync_with_peer))
        .route(
            "/private/dataexchanges/:id/chain/:service/complete",
            put(complete_step),
        )
        .route(
            "/private/dataexchanges/:id/chain/:service/connector",
            put(bind_step),
        )
}

/// Peer-to-peer sync, keyed by exchange identifier.
pub fn sync_routes() -> Router<AppState> {
    Router::new().route(
        "/private/dataexchanges/exchangeidentifier/:identifier",
        put(apply_remote_update),
    )
}

/// A peer asks us to hold a mirror of its exchange.
async fn create_mirror(
    State(state): State<AppState>,
    JsonBody(snapshot): JsonBody<DataExchangeSnapshot>,
) -> Result<(StatusCode, Json<DataExchange>), ApiError> {
    let exchange = state.exchanges.create_mirror(snapshot).await?;
    Ok((StatusCode::CREATED, Json(exchange)))
}

/// Start a new exchange from this connector.
async fn initiate(
    State(state): State<AppState>,
    JsonBody(new): JsonBody<NewDataExchange>,
) -> Result<(StatusCode, Json<DataExchange>), ApiError> {
    let exchange = state.exchanges.create(new).await?;
    info!(
        id = %exchange.id,
        identifier = %exchange.exchange_identifier,
        "[dc-05] Data exchange initiated"
    );
    Ok((StatusCode::CREATED, Json(exchange)))
}

async fn get_exchange(State(state): State<AppState>, Path(id): Path<String>) -> ExchangeResponse {
    Ok(Json(state.exchanges.get(&id).await?))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<StatusUpdate>,
) -> ExchangeResponse {
    if update.status.trim().is_empty() {
        return Err(ApiError::bad_request("status is required"));
    }
    let exchange = state
        .exchanges
        .update_status(&id, &update.status, update.payload)
        .await?;
    Ok(Json(exchange))
}

async fn sync_with_peer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<EndpointBody>,
) -> ExchangeResponse {
    state.exchanges.sync_with_peer(&id, &body.endpoint).await?;
    Ok(Json(state.exchanges.get(&id).await?))
}

async fn complete_step(
    State(state): State<AppState>,
    Path((id, service)): Path<(String, String)>,
) -> ExchangeResponse {
    let exchange = state
        .exchanges
        .complete_service_chain_step(&id, &service)
        .await?;
    Ok(Json(exchange))
}

async fn bind_step(
    State(state): State<AppState>,
    Path((id, service)): Path<(String, String)>,
    JsonBody(body): JsonBody<EndpointBody>,
) -> ExchangeResponse {
    if body.endpoint.trim().is_empty() {
        return Err(ApiError::bad_request("endpoint is required"));
    }
    let exchange = state
        .exchanges
        .bind_chain_step(&id, &service, &body.endpoint)
        .await?;
    Ok(Json(exchange))
}

async fn apply_remote_update(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    ExchangeKey(key): ExchangeKey,
    JsonBody(snapshot): JsonBody<DataExchangeSnapshot>,
) -> ExchangeResponse {
    let exchange = state
        .exchanges
        .apply_remote_update(&identifier, &key, snapshot)
        .await?;
    Ok(Json(exchange))
}
