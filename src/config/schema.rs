//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route declarations, in dispatch declaration order.
    pub routes: Vec<RouteConfig>,

    /// Static asset fallback. Absent means no asset serving.
    pub assets: Option<AssetsConfig>,

    /// Upstream pass-through for unmatched requests. Absent means
    /// unmatched requests get a 404.
    pub upstream: Option<UpstreamConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Free-form deployment values exposed read-only to handlers.
    pub env: toml::value::Table,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
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

/// One route declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics. Defaults to the route
    /// pattern itself.
    #[serde(default)]
    pub name: String,

    /// Path pattern the route answers for (e.g., "/api/widgets/:id").
    pub route: String,

    /// Mount pattern; the matched prefix is stripped from the path the
    /// route's handlers see.
    #[serde(default = "default_mount")]
    pub mount: String,

    /// HTTP method filter. Empty matches every method.
    #[serde(default)]
    pub method: String,

    /// Registered handler names run during the middleware pass.
    #[serde(default)]
    pub middleware: Vec<String>,

    /// Registered handler names eligible for the terminal pass.
    #[serde(default)]
    pub terminal: Vec<String>,
}

fn default_mount() -> String {
    "/".to_string()
}

/// Static asset fallback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetsConfig {
    /// Directory served as the asset root.
    pub root: String,

    /// File served for the bare `/` path.
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

fn default_index_file() -> String {
    "index.html".to_string()
}

/// Upstream pass-through configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Upstream authority (e.g., "127.0.0.1:9000").
    pub address: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
