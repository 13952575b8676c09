//! # Connector Harness
//!
//! Runs a complete connector on an ephemeral local port: in-memory store,
//! real HTTP peer client, real gateway. Several harnesses in one test form a
//! small dataspace whose members sync with each other over TCP.

use anyhow::{Context, Result};
use dc_01_process_store::{InMemoryKVStore, KeyValueStore};
use dc_04_data_exchange::{HttpPeerSyncClient, EXCHANGE_KEY_HEADER};
use dc_05_api_gateway::ApiGatewayService;
use node_runtime::{ConnectorConfig, ConnectorContainer};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Bearer token shared by every harness connector.
pub const DATASPACE_TOKEN: &str = "dataspace-test-token";

/// One running connector.
pub struct TestConnector {
    pub endpoint: String,
    pub container: ConnectorContainer,
    http: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl TestConnector {
    /// Start a connector whose private API requires [`DATASPACE_TOKEN`].
    pub async fn start() -> Result<Self> {
        Self::start_with(|_| {}).await
    }

    /// Start a connector after adjusting its configuration.
    pub async fn start_with<F>(adjust: F) -> Result<Self>
    where
        F: FnOnce(&mut ConnectorConfig),
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind test listener")?;
        let endpoint = format!("http://{}", listener.local_addr()?);

        let mut config = ConnectorConfig::default();
        config.connector.self_endpoint = endpoint.clone();
        config.connector.private_token = Some(DATASPACE_TOKEN.to_string());
        config.sync.peer_bearer_token = Some(DATASPACE_TOKEN.to_string());
        config.sync.request_timeout = Duration::from_secs(5);
        config.sync.max_retries = 0;
        adjust(&mut config);
        config.validate()?;

        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryKVStore::new());
        let client = HttpPeerSyncClient::new(
            config.sync.request_timeout,
            config.sync.peer_bearer_token.clone(),
        )?;
        let container = ConnectorContainer::with_parts(config, store, Arc::new(client));
        let gateway =
            ApiGatewayService::new(container.config.gateway_config(), container.app_state())?;

        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let shutdown = async {
                let _ = rx.await;
            };
            if let Err(e) = gateway.serve_on(listener, shutdown).await {
                tracing::error!("Test connector stopped: {}", e);
            }
        });

        Ok(Self {
            endpoint,
            container,
            http: reqwest::Client::new(),
            shutdown: Some(tx),
            server: Some(server),
        })
    }

    /// Stop serving. Peers see this connector as unreachable afterwards.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(server) = self.server.take() {
            let _ = server.await;
        }
    }

    /// Send a request; `bearer` authenticates against the private API.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut request = self
            .http
            .request(method, format!("{}{}", self.endpoint, path));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let json = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok((status, json))
    }

    /// Public protocol POST.
    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, path, None, Some(body)).await
    }

    /// Public protocol GET.
    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, None, None).await
    }

    /// Private API call with the dataspace token.
    pub async fn private(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        self.send(method, path, Some(DATASPACE_TOKEN), body).await
    }

    /// Peer-style overwrite of the exchange with `identifier`, presenting `key`.
    pub async fn push_as_peer(
        &self,
        identifier: &str,
        key: &str,
        snapshot: Value,
    ) -> Result<(StatusCode, Value)> {
        let url = format!(
            "{}/private/dataexchanges/exchangeidentifier/{}",
            self.endpoint, identifier
        );
        let response = self
            .http
            .put(url)
            .header(EXCHANGE_KEY_HEADER, key)
            .json(&snapshot)
            .send()
            .await?;
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    /// Local copy of an exchange by record id.
    pub async fn exchange(&self, id: &str) -> Result<Value> {
        let (status, body) = self
            .private(Method::GET, &format!("/private/dataexchanges/{}", id), None)
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "GET exchange {} -> {}", id, status);
        Ok(body)
    }
}

impl Drop for TestConnector {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
