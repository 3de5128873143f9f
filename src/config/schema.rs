//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::Deserialize;

/// Identifying user agent sent to every upstream.
pub const DEFAULT_USER_AGENT: &str = "recipe-autofill-proxy/1.0";

/// Accept header preferring HTML, then XML, then anything.
pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Root configuration for the autofill proxy.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Outbound request settings.
    pub upstream: UpstreamConfig,

    /// Relayed response settings.
    pub relay: RelayConfig,

    /// Inbound request limits.
    pub limits: LimitsConfig,

    /// Fixed parameters of the hosting deployment.
    pub deployment: DeploymentConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Settings for the outbound fetch.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// `user-agent` header sent upstream.
    pub user_agent: String,

    /// `accept` header sent upstream.
    pub accept: String,

    /// Total time allowed for the fetch, including the body, in seconds.
    /// Must be shorter than `deployment.timeout_secs` so a hung upstream ends in a 502.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Redirects followed before giving up.
    pub max_redirects: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            timeout_secs: 25,
            connect_timeout_secs: 10,
            max_redirects: 20,
        }
    }
}

/// Settings applied to relayed upstream responses.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// `max-age` advertised in the `Cache-Control` header.
    pub cache_max_age_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            cache_max_age_secs: 900,
        }
    }
}

impl RelayConfig {
    /// Value of the `Cache-Control` header on a successful relay.
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache_max_age_secs)
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Deployment-time resource constraints.
///
/// These mirror what the hosting platform enforces. Only `timeout_secs`
/// changes runtime behavior (it bounds each request); the rest is reported
/// at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Network region the service is deployed to.
    pub region: String,

    /// Maximum invocation duration in seconds.
    pub timeout_secs: u64,

    /// Memory ceiling in MiB.
    pub memory_mib: u32,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            region: "us-central1".to_string(),
            timeout_secs: 30,
            memory_mib: 256,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
