//! Route tables and shared handler plumbing.

pub mod exchanges;
pub mod negotiations;
pub mod system;
pub mod transfers;

use crate::domain::messages::Message;
use crate::middleware::PrivateAuthLayer;
use crate::ApiError;
use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::Router;
use dc_02_negotiation::NegotiationApi;
use dc_03_transfer::TransferApi;
use dc_04_data_exchange::DataExchangeApi;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Subsystem handles shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub negotiations: Arc<dyn NegotiationApi>,
    pub transfers: Arc<dyn TransferApi>,
    pub exchanges: Arc<dyn DataExchangeApi>,
    /// Public base URL of this connector.
    pub self_endpoint: String,
}

/// JSON body whose decode failures use the gateway error envelope.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::new(rejection.status(), rejection.body_text()))?;
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
    }
}

/// Check a protocol message and read its typed content, echoing the body on
/// failure.
pub(crate) fn validate<T>(
    body: &Value,
    expected_type: &str,
    read: impl FnOnce(&Message) -> Result<T, String>,
) -> Result<T, ApiError> {
    Message::open(body, expected_type)
        .and_then(|message| read(&message))
        .map_err(|reason| ApiError::validation(reason, body.clone()))
}

/// Router for all routes: protocol, private and system.
pub fn router(state: AppState, private_token: Option<String>) -> Router {
    let private = exchanges::private_routes().route_layer(PrivateAuthLayer::new(private_token));

    Router::new()
        .merge(negotiations::routes())
        .merge(transfers::routes())
        .merge(private)
        .merge(exchanges::sync_routes())
        .merge(system::protocol_routes())
        .with_state(state)
        .merge(system::routes())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Gateway wired to real subsystems over in-memory stores.

    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, StatusCode};
    use dc_01_process_store::{InMemoryKVStore, KeyValueStore, ProcessRepository};
    use dc_02_negotiation::{NegotiationDependencies, NegotiationService};
    use dc_03_transfer::{TransferDependencies, TransferService};
    use dc_04_data_exchange::{
        DataExchangeService, ExchangeDependencies, NoopSyncObserver, RecordingSyncClient,
        StaticSelfEndpoint, SyncConfig,
    };
    use shared_types::{KeyedLocks, NoopTransitionObserver, UrnUuidGenerator};
    use tower::ServiceExt;

    pub const SELF_ENDPOINT: &str = "https://provider.example";

    pub struct TestGateway {
        pub state: AppState,
        pub router: Router,
        pub sync_client: Arc<RecordingSyncClient>,
    }

    impl TestGateway {
        pub fn new(private_token: Option<&str>) -> Self {
            let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryKVStore::new());
            let locks = Arc::new(KeyedLocks::new());
            let sync_client = Arc::new(RecordingSyncClient::new());

            let negotiations = NegotiationService::new(NegotiationDependencies {
                repository: ProcessRepository::new(store.clone()),
                pid_generator: Arc::new(UrnUuidGenerator),
                locks: locks.clone(),
                observer: Arc::new(NoopTransitionObserver),
            });
            let transfers = TransferService::new(TransferDependencies {
                repository: ProcessRepository::new(store.clone()),
                pid_generator: Arc::new(UrnUuidGenerator),
                locks: locks.clone(),
                observer: Arc::new(NoopTransitionObserver),
            });
            let exchanges = DataExchangeService::new(ExchangeDependencies {
                repository: ProcessRepository::new(store),
                sync_client: sync_client.clone(),
                self_endpoint: Arc::new(StaticSelfEndpoint::new(SELF_ENDPOINT)),
                locks,
                sync: SyncConfig {
                    max_retries: 0,
                    ..SyncConfig::default()
                },
                observer: Arc::new(NoopSyncObserver),
            });

            let state = AppState {
                negotiations: Arc::new(negotiations),
                transfers: Arc::new(transfers),
                exchanges: Arc::new(exchanges),
                self_endpoint: SELF_ENDPOINT.to_string(),
            };
            Self {
                router: router(state.clone(), private_token.map(str::to_string)),
                state,
                sync_client,
            }
        }

        pub async fn send(
            &self,
            method: Method,
            uri: &str,
            headers: &[(&str, &str)],
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = axum::http::Request::builder().method(method).uri(uri);
            for (name, value) in headers {
                builder = builder.header(*name, *value);
            }
            let body = match body {
                Some(json) => {
                    builder = builder.header("content-type", "application/json");
                    Body::from(json.to_string())
                }
                None => Body::empty(),
            };
            let response = self
                .router
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                })
            };
            (status, json)
        }

        pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
            self.send(Method::POST, uri, &[], Some(body)).await
        }

        pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Method::GET, uri, &[], None).await
        }
    }
}
