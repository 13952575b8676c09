//! Transfer process endpoints.
//!
//! Transitions resolve the process by the path pid alone; the body pids are
//! validated but not matched against the record.

use super::{validate, AppState, JsonBody};
use crate::domain::messages::{PidPair, Termination, TransferRequestMessage};
use crate::ApiError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use dc_03_transfer::{TransferProcess, TransferProcessMessage, TransferRequest};
use serde_json::Value;
use shared_types::{message_types, PidLookup, PidRole};

type TransferResponse = Result<Json<TransferProcessMessage>, ApiError>;

#[derive(Clone, Copy, Debug)]
enum Transition {
    Start,
    Complete,
    Suspend,
    Terminate,
}

impl Transition {
    fn message_type(&self) -> &'static str {
        match self {
            Transition::Start => message_types::TRANSFER_START,
            Transition::Complete => message_types::TRANSFER_COMPLETION,
            Transition::Suspend => message_types::TRANSFER_SUSPENSION,
            Transition::Terminate => message_types::TRANSFER_TERMINATION,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transfers/request", post(request))
        .route("/transfers/:provider_pid", get(get_by_provider))
        .route("/transfers/:provider_pid/start", post(provider_start))
        .route("/transfers/:provider_pid/completion", post(provider_completion))
        .route("/transfers/:provider_pid/suspension", post(provider_suspension))
        .route("/transfers/:provider_pid/termination", post(provider_termination))
        .route("/callback/transfers/:consumer_pid", get(get_by_consumer))
        .route("/callback/transfers/:consumer_pid/start", post(consumer_start))
        .route("/callback/transfers/:consumer_pid/completion", post(consumer_completion))
        .route("/callback/transfers/:consumer_pid/suspension", post(consumer_suspension))
        .route("/callback/transfers/:consumer_pid/termination", post(consumer_termination))
}

fn respond(process: TransferProcess) -> Json<TransferProcessMessage> {
    Json(process.to_message())
}

async fn get_by_provider(
    State(state): State<AppState>,
    Path(provider_pid): Path<String>,
) -> TransferResponse {
    let process = state.transfers.get(&PidLookup::Provider(provider_pid)).await?;
    Ok(Json(process.to_message()))
}

async fn get_by_consumer(
    State(state): State<AppState>,
    Path(consumer_pid): Path<String>,
) -> TransferResponse {
    let process = state.transfers.get(&PidLookup::Consumer(consumer_pid)).await?;
    Ok(Json(process.to_message()))
}

async fn request(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<(StatusCode, Json<TransferProcessMessage>), ApiError> {
    let message = validate(
        &body,
        message_types::TRANSFER_REQUEST,
        TransferRequestMessage::read,
    )?;
    let process = state
        .transfers
        .create_from_request(TransferRequest {
            consumer_pid: message.consumer_pid,
            provider_pid: message.provider_pid,
            agreement_id: message.agreement_id,
            format: message.format,
            data_address: message.data_address,
            callback_address: Some(message.callback_address),
        })
        .await?;
    Ok((StatusCode::CREATED, respond(process)))
}

async fn transition(
    state: &AppState,
    role: PidRole,
    path_pid: String,
    body: &Value,
    transition: Transition,
) -> TransferResponse {
    match transition {
        Transition::Start | Transition::Complete => {
            validate(body, transition.message_type(), PidPair::read)?;
        }
        Transition::Suspend | Transition::Terminate => {
            validate(body, transition.message_type(), Termination::read)?;
        }
    }

    let lookup = match role {
        PidRole::Provider => PidLookup::Provider(path_pid),
        PidRole::Consumer => PidLookup::Consumer(path_pid),
    };
    let process = match transition {
        Transition::Start => state.transfers.start(&lookup).await?,
        Transition::Complete => state.transfers.complete(&lookup).await?,
        Transition::Suspend => state.transfers.suspend(&lookup).await?,
        Transition::Terminate => state.transfers.terminate(&lookup).await?,
    };
    Ok(respond(process))
}

macro_rules! transition_handler {
    ($name:ident, $role:expr, $transition:expr) => {
        async fn $name(
            State(state): State<AppState>,
            Path(pid): Path<String>,
            JsonBody(body): JsonBody<Value>,
        ) -> TransferResponse {
            transition(&state, $role, pid, &body, $transition).await
        }
    };
}

transition_handler!(provider_start, PidRole::Provider, Transition::Start);
transition_handler!(provider_completion, PidRole::Provider, Transition::Complete);
transition_handler!(provider_suspension, PidRole::Provider, Transition::Suspend);
transition_handler!(provider_termination, PidRole::Provider, Transition::Terminate);
transition_handler!(consumer_start, PidRole::Consumer, Transition::Start);
transition_handler!(consumer_completion, PidRole::Consumer, Transition::Complete);
transition_handler!(consumer_suspension, PidRole::Consumer, Transition::Suspend);
transition_handler!(consumer_termination, PidRole::Consumer, Transition::Terminate);
