//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! relay handler and tower layers produce:
//!     → logging.rs (structured log events, request spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Upstream failure detail goes to logs only, never to the caller
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
