//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! Secrets are deliberately absent; see `credentials.rs`.

use serde::{Deserialize, Serialize};

use crate::authz::default_rules;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream API requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Ordered authorization allowlist. Replaces the built-in table when set.
    pub rules: Vec<RuleConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstream: UpstreamConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            rules: default_rules(),
        }
    }
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

/// Upstream target configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// URI scheme, `https` or `http`.
    pub scheme: String,

    /// Host, optionally with a port (e.g., "api.mackerelio.com").
    pub host: String,

    /// Honour `HTTPS_PROXY`/`HTTP_PROXY`/`NO_PROXY` for upstream calls.
    pub system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            host: "api.mackerelio.com".to_string(),
            system_proxy: true,
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole upstream exchange timeout in seconds (0 = none).
    pub upstream_secs: u64,

    /// TCP/TLS connect timeout in seconds (0 = none).
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 60,
            connect_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
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

/// One allowlist entry as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Rule identifier for logging.
    pub name: String,

    /// Regex over the URL path, anchors included.
    pub path: String,

    /// HTTP method.
    pub method: String,

    /// Exact set of permitted query parameter names.
    #[serde(default)]
    pub params: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();

        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.upstream.scheme, "https");
        assert_eq!(config.upstream.host, "api.mackerelio.com");
        assert_eq!(config.rules.len(), 10);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstream]
            scheme = "http"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.scheme, "http");
        assert_eq!(config.upstream.host, "api.mackerelio.com");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.timeouts.upstream_secs, 60);
        assert_eq!(config.rules, default_rules());
    }

    #[test]
    fn test_rules_replace_default_table() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [[rules]]
            name = "ListServices"
            path = "^/api/v0/services$"
            method = "GET"

            [[rules]]
            name = "FindHosts"
            path = "^/api/v0/hosts$"
            method = "GET"
            params = ["service"]
            "#,
        )
        .unwrap();

        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].name, "ListServices");
        assert!(config.rules[0].params.is_empty());
        assert_eq!(config.rules[1].params, vec!["service".to_string()]);
    }
}
