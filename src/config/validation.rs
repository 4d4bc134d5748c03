//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, the upstream target and every rule definition
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::uri::Authority;

use crate::authz::{Rule, RuleError};
use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),
    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
    #[error("upstream.scheme `{0}` must be `http` or `https`")]
    UpstreamScheme(String),
    #[error("upstream.host `{0}` is not a valid host")]
    UpstreamHost(String),
    #[error("rules must not be empty")]
    NoRules,
    #[error(transparent)]
    Rule(#[from] RuleError),
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if !matches!(config.upstream.scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::UpstreamScheme(config.upstream.scheme.clone()));
    }

    let host_ok = config
        .upstream
        .host
        .parse::<Authority>()
        .map(|authority| !authority.host().is_empty() && !authority.as_str().contains('@'))
        .unwrap_or(false);
    if !host_ok {
        errors.push(ValidationError::UpstreamHost(config.upstream.host.clone()));
    }

    if config.rules.is_empty() {
        errors.push(ValidationError::NoRules);
    }

    for rule in &config.rules {
        if let Err(e) = Rule::compile(rule) {
            errors.push(e.into());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
