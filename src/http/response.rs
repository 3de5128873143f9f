//! Response construction.
//!
//! # Responsibilities
//! - Shape relayed upstream responses (status, body, cache header)
//! - Map handler errors to status codes and JSON error bodies
//! - Define the CORS headers every response carries
//!
//! # Design Decisions
//! - Error bodies are always `{"error": "<message>"}`
//! - Upstream failure detail is logged, never returned to the caller
//! - CORS headers are applied by an outer layer, so even responses the
//!   handler never sees (413, 408) carry them

use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
            CACHE_CONTROL, CONTENT_TYPE,
        },
        HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::upstream::{FetchError, UpstreamResponse};

/// Headers granting any origin read access to every response.
pub fn cors_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        (
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        ),
        (ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, OPTIONS")),
    ]
}

/// Failures surfaced to the caller. `Display` is the caller-facing message.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Missing \"url\" query parameter.")]
    MissingUrl,

    #[error("Invalid url parameter.")]
    InvalidUrl(#[source] url::ParseError),

    #[error("Only http/https URLs are allowed.")]
    UnsupportedScheme(String),

    #[error("Failed to fetch the requested URL.")]
    Upstream(#[source] FetchError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl | ProxyError::InvalidUrl(_) | ProxyError::UnsupportedScheme(_) => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Answer to a CORS preflight.
pub fn preflight() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Mirror the upstream status and body to the caller.
pub fn relayed(upstream: UpstreamResponse, cache_control: HeaderValue) -> Response {
    (
        upstream.status,
        [
            (CACHE_CONTROL, cache_control),
            (CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8")),
        ],
        upstream.body,
    )
        .into_response()
}
