//! Outbound fetch subsystem.
//!
//! # Data Flow
//! ```text
//! validated target Url
//!     → Fetcher::fetch (one GET, redirects followed)
//!     → UpstreamResponse { status, body } | FetchError
//!     → handed back to the relay handler
//! ```
//!
//! # Design Decisions
//! - The handler only sees the `Fetcher` trait so it can run against stubs
//! - Body is drained inside `fetch`; a failure while reading it is a fetch failure
//! - No retries: every error is terminal for the request

pub mod client;

use std::future::Future;

use axum::http::StatusCode;
use thiserror::Error;
use url::Url;

pub use client::ReqwestFetcher;

/// What the upstream answered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Errors that can occur while fetching the target.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Fetch did not complete within the configured timeout.
    #[error("upstream timed out after {0} seconds")]
    Timeout(u64),

    /// Connection, DNS, TLS or redirect failure before a response arrived.
    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Response arrived but its body could not be read.
    #[error("reading upstream body failed: {0}")]
    Body(#[source] reqwest::Error),
}

/// Capability to fetch a URL on behalf of a caller.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, target: &Url) -> impl Future<Output = Result<UpstreamResponse, FetchError>> + Send;
}
