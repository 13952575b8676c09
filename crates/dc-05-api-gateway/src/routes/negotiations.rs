//! Contract negotiation endpoints.
//!
//! `/negotiations/...` is the provider side, keyed by provider pid.
//! `/callback/negotiations/...` is the consumer side, keyed by consumer pid.

use super::{validate, AppState, JsonBody};
use crate::domain::messages::{
    ContractAgreement, ContractOffer, ContractRequest, NegotiationEventMessage, PidPair,
    Termination,
};
use crate::ApiError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use dc_02_negotiation::{
    ContractNegotiation, ContractNegotiationMessage, NegotiationEvent, NegotiationOffer,
    NegotiationRequest, TerminationDetail,
};
use serde_json::Value;
use shared_types::{message_types, PidLookup, PidRole};

type NegotiationResponse = Result<Json<ContractNegotiationMessage>, ApiError>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/negotiations/request", post(request))
        .route("/negotiations/offers", post(offer))
        .route("/negotiations/:provider_pid", get(get_by_provider))
        .route("/negotiations/:provider_pid/request", post(provider_request))
        .route("/negotiations/:provider_pid/events", post(provider_event))
        .route(
            "/negotiations/:provider_pid/agreement/verification",
            post(verification),
        )
        .route("/negotiations/:provider_pid/termination", post(provider_termination))
        .route("/callback/negotiations/:consumer_pid", get(get_by_consumer))
        .route("/callback/negotiations/:consumer_pid/offers", post(consumer_offer))
        .route("/callback/negotiations/:consumer_pid/agreement", post(agreement))
        .route("/callback/negotiations/:consumer_pid/events", post(consumer_event))
        .route(
            "/callback/negotiations/:consumer_pid/termination",
            post(consumer_termination),
        )
}

fn respond(negotiation: ContractNegotiation) -> Json<ContractNegotiationMessage> {
    Json(negotiation.to_message())
}

async fn get_by_provider(
    State(state): State<AppState>,
    Path(provider_pid): Path<String>,
) -> NegotiationResponse {
    let negotiation = state
        .negotiations
        .get(&PidLookup::Provider(provider_pid))
        .await?;
    Ok(Json(negotiation.to_message()))
}

async fn get_by_consumer(
    State(state): State<AppState>,
    Path(consumer_pid): Path<String>,
) -> NegotiationResponse {
    let negotiation = state
        .negotiations
        .get(&PidLookup::Consumer(consumer_pid))
        .await?;
    Ok(Json(negotiation.to_message()))
}

/// Consumer opens (or refers to) a negotiation.
async fn request(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<(StatusCode, Json<ContractNegotiationMessage>), ApiError> {
    let message = validate(&body, message_types::CONTRACT_REQUEST, ContractRequest::read)?;
    let negotiation = state
        .negotiations
        .create_from_request(NegotiationRequest {
            consumer_pid: message.consumer_pid,
            provider_pid: message.provider_pid,
            callback_address: Some(message.callback_address),
        })
        .await?;
    Ok((StatusCode::CREATED, respond(negotiation)))
}

/// Provider-initiated offer received by a consumer.
async fn offer(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<(StatusCode, Json<ContractNegotiationMessage>), ApiError> {
    let message = validate(&body, message_types::CONTRACT_OFFER, ContractOffer::read)?;
    let negotiation = state
        .negotiations
        .create_from_offer(NegotiationOffer {
            provider_pid: Some(message.provider_pid),
            callback_address: Some(message.callback_address),
        })
        .await?;
    Ok((StatusCode::CREATED, respond(negotiation)))
}

async fn provider_request(
    State(state): State<AppState>,
    Path(provider_pid): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> NegotiationResponse {
    let message = validate(&body, message_types::CONTRACT_REQUEST, ContractRequest::read)?;
    let lookup = PidLookup::from_path(
        PidRole::Provider,
        &provider_pid,
        Some(&message.consumer_pid),
    );
    let negotiation = state.negotiations.accept_offer_as_request(&lookup).await?;
    Ok(respond(negotiation))
}

async fn consumer_offer(
    State(state): State<AppState>,
    Path(consumer_pid): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> NegotiationResponse {
    let message = validate(&body, message_types::CONTRACT_OFFER, ContractOffer::read)?;
    let lookup = PidLookup::from_path(
        PidRole::Consumer,
        &consumer_pid,
        Some(&message.provider_pid),
    );
    let negotiation = state.negotiations.accept_offer_as_request(&lookup).await?;
    Ok(respond(negotiation))
}

async fn apply_event(
    state: &AppState,
    role: PidRole,
    path_pid: &str,
    body: &Value,
    allowed: NegotiationEvent,
) -> NegotiationResponse {
    let message = validate(body, message_types::CONTRACT_NEGOTIATION_EVENT, |m| {
        NegotiationEventMessage::read(m, allowed.as_str())
    })?;
    let counterpart = counterpart_pid(role, &message.pids);
    let lookup = PidLookup::from_path(role, path_pid, Some(counterpart));
    let negotiation = state
        .negotiations
        .apply_event(role, &lookup, allowed)
        .await?;
    Ok(respond(negotiation))
}

async fn provider_event(
    State(state): State<AppState>,
    Path(provider_pid): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> NegotiationResponse {
    apply_event(
        &state,
        PidRole::Provider,
        &provider_pid,
        &body,
        NegotiationEvent::Accepted,
    )
    .await
}

async fn consumer_event(
    State(state): State<AppState>,
    Path(consumer_pid): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> NegotiationResponse {
    apply_event(
        &state,
        PidRole::Consumer,
        &consumer_pid,
        &body,
        NegotiationEvent::Finalized,
    )
    .await
}

async fn agreement(
    State(state): State<AppState>,
    Path(consumer_pid): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> NegotiationResponse {
    let message = validate(&body, message_types::CONTRACT_AGREEMENT, ContractAgreement::read)?;
    let lookup = PidLookup::from_path(
        PidRole::Consumer,
        &consumer_pid,
        Some(&message.pids.provider_pid),
    );
    let negotiation = state.negotiations.record_agreement(&lookup).await?;
    Ok(respond(negotiation))
}

async fn verification(
    State(state): State<AppState>,
    Path(provider_pid): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> NegotiationResponse {
    validate(
        &body,
        message_types::CONTRACT_AGREEMENT_VERIFICATION,
        PidPair::read,
    )?;
    let negotiation = state.negotiations.verify_agreement(&provider_pid).await?;
    Ok(respond(negotiation))
}

async fn terminate(
    state: &AppState,
    role: PidRole,
    path_pid: &str,
    body: &Value,
) -> NegotiationResponse {
    let message = validate(
        body,
        message_types::CONTRACT_NEGOTIATION_TERMINATION,
        Termination::read,
    )?;
    let counterpart = counterpart_pid(role, &message.pids);
    let lookup = PidLookup::from_path(role, path_pid, Some(counterpart));
    let detail = TerminationDetail {
        code: message.code,
        reasons: message.reasons,
    };
    let negotiation = state.negotiations.terminate(&lookup, detail).await?;
    Ok(respond(negotiation))
}

async fn provider_termination(
    State(state): State<AppState>,
    Path(provider_pid): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> NegotiationResponse {
    terminate(&state, PidRole::Provider, &provider_pid, &body).await
}

async fn consumer_termination(
    State(state): State<AppState>,
    Path(consumer_pid): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> NegotiationResponse {
    terminate(&state, PidRole::Consumer, &consumer_pid, &body).await
}

/// The pid the body carries for the side opposite the path.
fn counterpart_pid(path_role: PidRole, pids: &PidPair) -> &str {
    match path_role {
        PidRole::Provider => &pids.consumer_pid,
        PidRole::Consumer => &pids.provider_pid,
    }
}
