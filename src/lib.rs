//! Authorizing API key gateway.
//!
//! Accepts requests carrying a placeholder `X-Api-Key`, checks them against
//! an ordered allowlist of (path, method, query parameter names) rules and
//! forwards the permitted ones to a single upstream API with the real key.

// Core subsystems
pub mod authz;
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use authz::{Authorizer, Decision};
pub use config::{GatewayConfig, ProxyCredentials};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
