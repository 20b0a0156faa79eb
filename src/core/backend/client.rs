//! HTTP client for the PetShop backend API
//!
//! Every outbound call is built fresh from the shared connection pool and gets the
//! caller's bearer token attached on that request only. The pooled `reqwest::Client`
//! carries no default `Authorization` header, so a token can never outlive the call it
//! was attached to or leak into a call made for another session.
//!
//! 401/403 responses are surfaced as-is; this layer never refreshes or retries.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use super::models::{Ack, Envelope};
use crate::core::auth::Session;
use crate::core::config::Config;
use crate::core::error::ApiError;

/// Message used when the backend gives no usable error text
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

/// Backend call failures
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Network failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid resource id: {0:?}")]
    InvalidId(String),
}

impl BackendError {
    /// HTTP status returned by the backend, if it answered
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend rejected the bearer token (or its role)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Text suitable for a user-facing notification
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Status { message, .. } => message.clone(),
            BackendError::InvalidId(_) => "Invalid id".to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            BackendError::Status { status, .. } => match StatusCode::from_u16(*status) {
                Ok(StatusCode::UNAUTHORIZED) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                Ok(StatusCode::FORBIDDEN) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                Ok(StatusCode::NOT_FOUND) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                Ok(s) if s.is_client_error() => (s, "BAD_REQUEST"),
                _ => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
            },
            BackendError::Transport(_) => (StatusCode::BAD_GATEWAY, "BACKEND_UNREACHABLE"),
            BackendError::Malformed(_) => (StatusCode::BAD_GATEWAY, "MALFORMED_RESPONSE"),
            BackendError::InvalidId(_) => (StatusCode::BAD_REQUEST, "INVALID_ID"),
        };

        ApiError::new(self.user_message(), code).with_status(status)
    }
}

/// Client for the backend REST API
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Arc<str>,
}

impl BackendClient {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: Arc::from(base_url.as_ref().trim_end_matches('/')),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_base())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/category`
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request, attaching `session`'s access token when there is one
    pub fn request(&self, method: Method, path: &str, session: Option<&Session>) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));

        match session {
            Some(session) => builder.bearer_auth(&session.access_token),
            None => builder,
        }
    }

    /// Send a request and decode the `data` field of the response envelope
    pub async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let body = self.dispatch(request).await?;

        let envelope: Envelope<T> =
            serde_json::from_slice(&body).map_err(|e| BackendError::Malformed(e.to_string()))?;

        Ok(envelope.data)
    }

    /// Send a request whose payload is not needed, keeping the backend's message
    pub async fn acknowledge(&self, request: RequestBuilder) -> Result<Ack, BackendError> {
        let body = self.dispatch(request).await?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Ack::default());
        }

        serde_json::from_slice(&body).map_err(|e| BackendError::Malformed(e.to_string()))
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Vec<u8>, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if status.is_success() {
            return Ok(body);
        }

        let message = failure_message(&body).unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
        tracing::warn!("Backend responded {}: {}", status, message);

        Err(BackendError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pull `message` (or `error`) out of a backend error body
fn failure_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;

    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
