//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router around the relay handler
//! - Wire up middleware (CORS headers, request ID, tracing, deadline, body limit)
//! - Bind server to listener and stop on shutdown

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::relay::{relay, RelayState};
use crate::http::response::cors_headers;
use crate::upstream::{Fetcher, ReqwestFetcher};

/// HTTP server for the autofill proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server that fetches through a `reqwest` client built from `config`.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let fetcher = ReqwestFetcher::from_config(&config.upstream)?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Create a server around any fetcher.
    pub fn with_fetcher<F: Fetcher>(config: ProxyConfig, fetcher: F) -> Self {
        let router = build_router(&config, fetcher);
        Self { router, config }
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            region = %self.config.deployment.region,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
///
/// The result is a plain service: tests drive it with `oneshot`, no socket needed.
#[allow(deprecated)]
pub fn build_router<F: Fetcher>(config: &ProxyConfig, fetcher: F) -> Router {
    let cache_control = HeaderValue::from_str(&config.relay.cache_control())
        .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=900"));

    let state = RelayState {
        fetcher: Arc::new(fetcher),
        cache_control,
    };

    let mut router = Router::new()
        .route("/{*path}", any(relay::<F>))
        .route("/", any(relay::<F>))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.deployment.timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    for (name, value) in cors_headers() {
        router = router.layer(SetResponseHeaderLayer::overriding(name, value));
    }

    router
}
