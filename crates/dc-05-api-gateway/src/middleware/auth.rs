//! Bearer-token guard for the private API.
//!
//! When no token is configured every request passes; the runtime warns about
//! this at startup.

use crate::ApiError;
use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Authentication layer
#[derive(Clone, Default)]
pub struct PrivateAuthLayer {
    token: Option<Arc<str>>,
}

impl PrivateAuthLayer {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.map(Arc::from),
        }
    }
}

impl<S> Layer<S> for PrivateAuthLayer {
    type Service = PrivateAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PrivateAuthService {
            inner,
            token: self.token.clone(),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct PrivateAuthService<S> {
    inner: S,
    token: Option<Arc<str>>,
}

impl<S> Service<Request<Body>> for PrivateAuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let authorized = match &self.token {
            Some(expected) => bearer_matches(&req, expected),
            None => true,
        };
        // Swap in the clone that was polled ready.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            if !authorized {
                warn!(path = %req.uri().path(), "[dc-05] Private API access denied");
                return Ok(unauthorized_response());
            }
            debug!(path = %req.uri().path(), "[dc-05] Private API access granted");
            inner.call(req).await
        })
    }
}

fn bearer_matches<B>(req: &Request<B>, expected: &str) -> bool {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| constant_time_compare(token.trim(), expected))
}

/// Constant-time string comparison.
///
/// Both inputs are padded to the longer length with different fill bytes, so
/// the comparison time does not depend on where the first mismatch is.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    let max_len = std::cmp::max(a.len(), b.len());
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);
    (lengths_equal & contents_equal).into()
}

fn unauthorized_response() -> Response {
    let mut response = ApiError::unauthorized("Missing or invalid bearer token").into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}
