//! Extractor for the exchange key a peer presents on sync calls.

use crate::ApiError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use dc_04_data_exchange::{KeyRejection, EXCHANGE_KEY_HEADER};

/// Value of the `ptx-data-exchange-key` header. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeKey(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ExchangeKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(EXCHANGE_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| ExchangeKey(key.to_string()))
            .ok_or_else(|| ApiError::unauthorized(KeyRejection::Missing.to_string()))
    }
}
