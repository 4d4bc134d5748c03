//! Request authorization subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path, query)
//!     → authorizer.rs (first structural match over the ordered table)
//!     → rule.rs (path regex + method, then parameter-name policy)
//!     → Return: Decision (NoMatch / Denied / Allowed)
//!
//! Rule compilation (at startup):
//!     RuleConfig[] (config file or default table)
//!     → compile regexes and methods
//!     → freeze as immutable Authorizer
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - Order is significant: the first path+method match decides alone
//! - Parameter values are never inspected

pub mod authorizer;
pub mod rule;

pub use authorizer::{query_param_names, Authorizer, Decision, DenyReason};
pub use rule::{Rule, RuleError};

use crate::config::RuleConfig;

/// The built-in allowlist for the Mackerel API.
///
/// More specific host routes (retire, metadata, status) come before the
/// generic `hosts/.*` routes so their policy wins.
pub fn default_rules() -> Vec<RuleConfig> {
    const TABLE: &[(&str, &str, &str, &[&str])] = &[
        ("CreateGraphDefs", "^/api/v0/graph-defs/create$", "POST", &[]),
        ("RetireHost", "^/api/v0/hosts/.*/retire$", "POST", &[]),
        ("FindHosts", "^/api/v0/hosts$", "GET", &["customIdentifier", "status"]),
        ("PostCheckReports", "^/api/v0/monitoring/checks/report$", "POST", &[]),
        ("PutHostMetaData", "^/api/v0/hosts/.*/metadata/.*$", "PUT", &[]),
        ("UpdateHostStatus", "^/api/v0/hosts/.*/status$", "POST", &[]),
        ("UpdateHost", "^/api/v0/hosts/.*$", "PUT", &[]),
        ("PostHostMetricValues", "^/api/v0/tsdb$", "POST", &[]),
        ("FindHost", "^/api/v0/hosts/.*$", "GET", &[]),
        ("CreateHost", "^/api/v0/hosts$", "POST", &[]),
    ];

    TABLE
        .iter()
        .map(|(name, path, method, params)| RuleConfig {
            name: (*name).to_string(),
            path: (*path).to_string(),
            method: (*method).to_string(),
            params: params.iter().map(|p| (*p).to_string()).collect(),
        })
        .collect()
}
