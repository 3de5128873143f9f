//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and header values before they reach the server
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! Returns all validation errors, not just the first.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: not a valid HTTP header value")]
    InvalidHeader { field: &'static str },

    #[error("upstream.timeout_secs ({upstream}) must be shorter than deployment.timeout_secs ({deployment})")]
    UpstreamOutlivesDeadline { upstream: u64, deployment: u64 },
}

/// Check a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    check_header(&mut errors, "upstream.user_agent", &config.upstream.user_agent);
    check_header(&mut errors, "upstream.accept", &config.upstream.accept);

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "upstream.timeout_secs" });
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "upstream.connect_timeout_secs" });
    }
    if config.deployment.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "deployment.timeout_secs" });
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "limits.max_body_size" });
    }

    if config.deployment.timeout_secs > 0 && config.upstream.timeout_secs >= config.deployment.timeout_secs {
        errors.push(ValidationError::UpstreamOutlivesDeadline {
            upstream: config.upstream.timeout_secs,
            deployment: config.deployment.timeout_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_header(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if HeaderValue::from_str(value).is_err() {
        errors.push(ValidationError::InvalidHeader { field });
    }
}
