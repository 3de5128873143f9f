//! The proxy handler.
//!
//! One invocation per inbound request: answer preflights, validate the
//! target, fetch it once, mirror status and body back.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
};

use crate::http::request::{extract_url, resolve_target, X_REQUEST_ID};
use crate::http::response::{preflight, relayed, ProxyError};
use crate::observability::metrics::{self, Outcome};
use crate::upstream::Fetcher;

/// Shared, read-only handler state.
pub struct RelayState<F> {
    pub fetcher: Arc<F>,
    pub cache_control: HeaderValue,
}

impl<F> Clone for RelayState<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            cache_control: self.cache_control.clone(),
        }
    }
}

pub async fn relay<F: Fetcher>(
    State(state): State<RelayState<F>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start_time = Instant::now();
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    if method == Method::OPTIONS {
        return finish(&method, Outcome::Preflight, preflight(), start_time);
    }

    let target = match resolve_target(extract_url(uri.query(), &headers, &body)) {
        Ok(target) => target,
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "Rejected request");
            return finish(&method, Outcome::Rejected, e.into_response(), start_time);
        }
    };

    tracing::debug!(request_id = %request_id, url = %target, "Fetching upstream");

    match state.fetcher.fetch(&target).await {
        Ok(upstream) => {
            tracing::info!(
                request_id = %request_id,
                url = %target,
                status = %upstream.status,
                bytes = upstream.body.len(),
                "Relayed upstream response"
            );
            let response = relayed(upstream, state.cache_control.clone());
            finish(&method, Outcome::Relayed, response, start_time)
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, url = %target, error = %e, "Autofill proxy error");
            let response = ProxyError::Upstream(e).into_response();
            finish(&method, Outcome::UpstreamError, response, start_time)
        }
    }
}

fn finish(method: &Method, outcome: Outcome, response: Response, start_time: Instant) -> Response {
    metrics::record_request(method.as_str(), response.status().as_u16(), outcome, start_time);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;
    use crate::http::server::build_router;
    use crate::upstream::{FetchError, UpstreamResponse};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;
    use url::Url;

    /// Answers every fetch with a canned outcome and records the targets.
    #[derive(Clone)]
    struct StubFetcher {
        reply: Option<(StatusCode, &'static str)>,
        delay: Option<Duration>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl StubFetcher {
        fn ok(status: StatusCode, body: &'static str) -> Self {
            Self {
                reply: Some((status, body)),
                delay: None,
                calls: Arc::default(),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                delay: None,
                calls: Arc::default(),
            }
        }

        fn hanging(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::ok(StatusCode::OK, "too late")
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Fetcher for StubFetcher {
        async fn fetch(&self, target: &Url) -> Result<UpstreamResponse, FetchError> {
            self.calls.lock().unwrap().push(target.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.reply {
                Some((status, body)) => Ok(UpstreamResponse {
                    status,
                    body: body.to_string(),
                }),
                None => Err(FetchError::Timeout(30)),
            }
        }
    }

    fn app(fetcher: &StubFetcher) -> Router {
        build_router(&ProxyConfig::default(), fetcher.clone())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn assert_cors(headers: &HeaderMap) {
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, Authorization");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");
    }

    #[tokio::test]
    async fn test_preflight_short_circuits() {
        let fetcher = StubFetcher::ok(StatusCode::OK, "<html></html>");
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/?url=https://example.com/recipe")
            .body(Body::empty())
            .unwrap();

        let (status, headers, body) = send(app(&fetcher), request).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
        assert_cors(&headers);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_url() {
        let fetcher = StubFetcher::ok(StatusCode::OK, "");
        let (status, headers, body) = send(app(&fetcher), get("/")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"Missing \"url\" query parameter."}"#);
        assert_cors(&headers);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_bracketed_url_key_is_missing() {
        let fetcher = StubFetcher::ok(StatusCode::OK, "");
        let (status, headers, body) = send(app(&fetcher), get("/?url%5B%5D=https://example.com")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"Missing \"url\" query parameter."}"#);
        assert_cors(&headers);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let fetcher = StubFetcher::ok(StatusCode::OK, "");
        let (status, headers, body) = send(app(&fetcher), get("/?url=not%20a%20url")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"Invalid url parameter."}"#);
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn test_disallowed_schemes() {
        let fetcher = StubFetcher::ok(StatusCode::OK, "");
        for uri in ["/?url=ftp://example.com/file", "/?url=file:///etc/passwd"] {
            let (status, headers, body) = send(app(&fetcher), get(uri)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, r#"{"error":"Only http/https URLs are allowed."}"#);
            assert_cors(&headers);
        }
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_relays_upstream_body() {
        let fetcher = StubFetcher::ok(StatusCode::OK, "<html><h1>Pancakes</h1></html>");
        let (status, headers, body) =
            send(app(&fetcher), get("/?url=https://example.com/recipe")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<html><h1>Pancakes</h1></html>");
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=900");
        assert_cors(&headers);
        assert_eq!(fetcher.calls(), vec!["https://example.com/recipe".to_string()]);
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_relayed() {
        let fetcher = StubFetcher::ok(StatusCode::NOT_FOUND, "<html>Not Found</html>");
        let (status, headers, body) =
            send(app(&fetcher), get("/?url=http://example.com/missing")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "<html>Not Found</html>");
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=900");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_bad_gateway() {
        let fetcher = StubFetcher::failing();
        let (status, headers, body) =
            send(app(&fetcher), get("/?url=https://unreachable.example")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, r#"{"error":"Failed to fetch the requested URL."}"#);
        assert!(headers.get(header::CACHE_CONTROL).is_none());
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn test_post_json_body() {
        let fetcher = StubFetcher::ok(StatusCode::OK, "<html></html>");
        let request = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"url":"https://example.com/soup"}"#))
            .unwrap();

        let (status, _, _) = send(app(&fetcher), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetcher.calls(), vec!["https://example.com/soup".to_string()]);
    }

    #[tokio::test]
    async fn test_query_takes_precedence_over_body() {
        let fetcher = StubFetcher::ok(StatusCode::OK, "<html></html>");
        let request = Request::builder()
            .method(Method::POST)
            .uri("/?url=https://query.example/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"url":"https://body.example/"}"#))
            .unwrap();

        send(app(&fetcher), request).await;

        assert_eq!(fetcher.calls(), vec!["https://query.example/".to_string()]);
    }

    #[tokio::test]
    async fn test_any_path_is_served() {
        let fetcher = StubFetcher::ok(StatusCode::OK, "ok");
        let (status, _, _) =
            send(app(&fetcher), get("/recipeAutofillProxy?url=https://example.com")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_repeated_request_is_stable() {
        let fetcher = StubFetcher::ok(StatusCode::OK, "<html>same</html>");
        let router = app(&fetcher);

        let first = send(router.clone(), get("/?url=https://example.com/a")).await;
        let second = send(router, get("/?url=https://example.com/a")).await;

        assert_eq!(first.0, second.0);
        assert_eq!(first.2, second.2);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_request_id_is_assigned_and_propagated() {
        let fetcher = StubFetcher::ok(StatusCode::OK, "");
        let (_, headers, _) = send(app(&fetcher), get("/")).await;
        assert!(headers.contains_key(X_REQUEST_ID));

        let request = Request::builder()
            .uri("/")
            .header(X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();
        let (_, headers, _) = send(app(&fetcher), request).await;
        assert_eq!(headers[X_REQUEST_ID], "abc-123");
    }

    #[tokio::test]
    async fn test_oversized_body_still_has_cors() {
        let mut config = ProxyConfig::default();
        config.limits.max_body_size = 16;
        let fetcher = StubFetcher::ok(StatusCode::OK, "");
        let router = build_router(&config, fetcher.clone());

        let payload = r#"{"url":"https://example.com/a-rather-long-recipe-path"}"#;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, payload.len())
            .body(Body::from(payload))
            .unwrap();

        let (status, headers, _) = send(router, request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_cors(&headers);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_request_deadline_answers_with_cors() {
        let mut config = ProxyConfig::default();
        config.deployment.timeout_secs = 1;
        let fetcher = StubFetcher::hanging(Duration::from_secs(10));
        let router = build_router(&config, fetcher.clone());

        let (status, headers, _) = tokio::time::timeout(
            Duration::from_secs(5),
            send(router, get("/?url=https://slow.example/recipe")),
        )
        .await
        .expect("request should end at the deadline");

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_cors(&headers);
        assert_eq!(fetcher.calls().len(), 1);
    }
}
