//! `reqwest`-backed fetcher.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::redirect::Policy;
use url::Url;

use super::{FetchError, Fetcher, UpstreamResponse};
use crate::config::UpstreamConfig;

/// Fetcher using a pooled `reqwest::Client`.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl ReqwestFetcher {
    /// Build a client carrying the configured identity headers and limits.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        // Validated at config load; an invalid value just leaves reqwest's default.
        if let Ok(accept) = HeaderValue::from_str(&config.accept) {
            headers.insert(ACCEPT, accept);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(Policy::limited(config.max_redirects))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    fn classify(&self, err: reqwest::Error, reading_body: bool) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else if reading_body {
            FetchError::Body(err)
        } else {
            FetchError::Request(err)
        }
    }
}

impl Fetcher for ReqwestFetcher {
    /// The body is always read as UTF-8, whatever charset the upstream declares.
    async fn fetch(&self, target: &Url) -> Result<UpstreamResponse, FetchError> {
        let response = self
            .client
            .get(target.clone())
            .send()
            .await
            .map_err(|e| self.classify(e, false))?;

        let status = response.status();
        tracing::debug!(
            url = %target,
            final_url = %response.url(),
            status = %status,
            "Upstream responded"
        );

        let bytes = response.bytes().await.map_err(|e| self.classify(e, true))?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(UpstreamResponse { status, body })
    }
}
