//! # HTTP Peer Sync Client
//!
//! [`PeerSyncClient`] over the private exchange API of other connectors:
//!
//! - `POST {endpoint}/private/dataexchanges` with a bearer token creates a
//!   mirror and answers `{"id": ...}`.
//! - `PUT {endpoint}/private/dataexchanges/exchangeidentifier/{identifier}`
//!   with the `ptx-data-exchange-key` header overwrites the mirror.

use crate::domain::{normalize_endpoint, DataExchangeSnapshot, PeerSyncError};
use crate::ports::outbound::PeerSyncClient;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Header carrying the exchange key on participant-to-participant updates.
pub const EXCHANGE_KEY_HEADER: &str = "ptx-data-exchange-key";

#[derive(Deserialize)]
struct MirrorCreated {
    id: String,
}

/// reqwest-backed client.
#[derive(Clone)]
pub struct HttpPeerSyncClient {
    http: reqwest::Client,
    bearer_token: Option<String>,
    timeout: Duration,
}

impl HttpPeerSyncClient {
    /// `bearer_token` authenticates mirror creation at peers.
    pub fn new(timeout: Duration, bearer_token: Option<String>) -> Result<Self, PeerSyncError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PeerSyncError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            bearer_token,
            timeout,
        })
    }

    fn map_error(&self, err: reqwest::Error) -> PeerSyncError {
        if err.is_timeout() {
            PeerSyncError::Timeout(self.timeout.as_millis() as u64)
        } else if let Some(status) = err.status() {
            PeerSyncError::Rejected(status.as_u16())
        } else {
            PeerSyncError::Transport(err.to_string())
        }
    }
}

/// Update URL at a peer, with the identifier escaped as one path segment.
fn update_url(endpoint: &str, identifier: &str) -> Result<reqwest::Url, PeerSyncError> {
    let mut url = reqwest::Url::parse(&normalize_endpoint(endpoint))
        .map_err(|e| PeerSyncError::Transport(format!("invalid peer endpoint: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| PeerSyncError::Transport(format!("invalid peer endpoint: {}", endpoint)))?
        .pop_if_empty()
        .extend(["private", "dataexchanges", "exchangeidentifier", identifier]);
    Ok(url)
}

#[async_trait]
impl PeerSyncClient for HttpPeerSyncClient {
    async fn create_mirror(
        &self,
        endpoint: &str,
        snapshot: &DataExchangeSnapshot,
    ) -> Result<String, PeerSyncError> {
        let url = format!("{}/private/dataexchanges", normalize_endpoint(endpoint));
        debug!(url = %url, "[dc-04] Creating mirror");

        let mut request = self.http.post(&url).json(snapshot);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.map_error(e))?;

        let created: MirrorCreated = response
            .json()
            .await
            .map_err(|e| PeerSyncError::Malformed(e.to_string()))?;
        if created.id.is_empty() {
            return Err(PeerSyncError::Malformed("empty mirror id".into()));
        }
        Ok(created.id)
    }

    async fn push_update(
        &self,
        endpoint: &str,
        snapshot: &DataExchangeSnapshot,
    ) -> Result<(), PeerSyncError> {
        let url = update_url(endpoint, &snapshot.exchange_identifier)?;
        debug!(url = %url, "[dc-04] Pushing exchange update");

        self.http
            .put(url)
            .header(EXCHANGE_KEY_HEADER, &snapshot.exchange_key)
            .json(snapshot)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.map_error(e))?;
        Ok(())
    }
}
