//! Error responses.
//!
//! # Responsibilities
//! - Define the errors a proxied request can end in
//! - Map each error to an HTTP status code and a JSON body
//!
//! # Status Mapping
//! ```text
//! unknown login in a named segment   → 404 Not Found
//! upstream rejected the Client-ID    → 400 Bad Request
//! user lookup failed                 → 502 Bad Gateway
//! forwarding to the upstream failed  → 502 Bad Gateway
//! unreadable / oversized body        → 400 Bad Request
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::ResolveError;
use crate::routing::MapError;

/// Everything that can stop a request from being proxied.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    #[error("upstream request failed: {0}")]
    Forward(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Map(MapError::NameNotFound { .. }) => StatusCode::NOT_FOUND,
            ProxyError::Map(MapError::Resolve(ResolveError::InvalidCredential(_))) => StatusCode::BAD_REQUEST,
            ProxyError::Map(MapError::Resolve(ResolveError::Upstream(_))) => StatusCode::BAD_GATEWAY,
            ProxyError::RequestBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::Forward(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Whether the caller, not the proxy or its upstream, is at fault.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            ProxyError::Map(MapError::NameNotFound { .. }) | ProxyError::RequestBody(_)
        )
    }
}

/// JSON error body: `{"error":"Not Found","status":404,"message":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorStatus {
    pub error: String,
    pub status: u16,
    pub message: String,
}

impl ErrorStatus {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            status: status.as_u16(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorStatus::new(status, self.to_string()))).into_response()
    }
}
