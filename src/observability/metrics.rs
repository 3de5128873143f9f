//! Metrics collection and exposition.
//!
//! # Metrics
//! - `autofill_requests_total` (counter): requests by method, status, outcome
//! - `autofill_request_duration_seconds` (histogram): latency by outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// How the handler disposed of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Preflight,
    Rejected,
    Relayed,
    UpstreamError,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Preflight => "preflight",
            Outcome::Rejected => "rejected",
            Outcome::Relayed => "relayed",
            Outcome::UpstreamError => "upstream_error",
        }
    }
}

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, outcome: Outcome, start_time: Instant) {
    counter!(
        "autofill_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!("autofill_request_duration_seconds", "outcome" => outcome.as_str())
        .record(start_time.elapsed().as_secs_f64());
}
