//! First-match request authorization.
//!
//! # Responsibilities
//! - Scan the ordered rule table for the first structural match
//! - Apply that rule's parameter policy, and only that rule's
//! - Report the outcome as an explicit `Decision`
//!
//! # Design Decisions
//! - Immutable after construction (shared across requests without locks)
//! - Linear scan with early termination; the table is small and ordered
//! - Query parameters are reduced to the set of distinct names

use std::collections::BTreeSet;
use std::fmt;

use axum::http::{Method, Uri};

use crate::authz::rule::{Rule, RuleError};
use crate::config::RuleConfig;

/// Why a structurally matched rule refused the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason<'a> {
    /// The number of distinct parameter names differs from the permitted set.
    ParamCount { permitted: usize, given: usize },
    /// A parameter name is not in the permitted set.
    ParamNotPermitted(&'a str),
}

/// Outcome of evaluating a request against the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<'a> {
    /// No rule matched on path and method.
    NoMatch,
    /// The first structural match rejected the parameters.
    Denied { rule: &'a str, reason: DenyReason<'a> },
    /// The first structural match accepted the parameters.
    Allowed { rule: &'a str },
}

impl Decision<'_> {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    /// Name of the rule that decided the request, if any did.
    pub fn rule(&self) -> Option<&str> {
        match self {
            Decision::NoMatch => None,
            Decision::Denied { rule, .. } | Decision::Allowed { rule } => Some(*rule),
        }
    }
}

impl fmt::Display for DenyReason<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::ParamCount { permitted, given } => {
                write!(f, "expected {} query parameters, got {}", permitted, given)
            }
            DenyReason::ParamNotPermitted(name) => write!(f, "query parameter `{}` not permitted", name),
        }
    }
}

impl fmt::Display for Decision<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::NoMatch => f.write_str("no rule matched"),
            Decision::Denied { rule, reason } => write!(f, "denied by {}: {}", rule, reason),
            Decision::Allowed { rule } => write!(f, "allowed by {}", rule),
        }
    }
}

/// Ordered allowlist of rules.
#[derive(Debug, Clone)]
pub struct Authorizer {
    rules: Vec<Rule>,
}

impl Authorizer {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile every rule definition, preserving order.
    pub fn from_config(rules: &[RuleConfig]) -> Result<Self, RuleError> {
        let rules = rules.iter().map(Rule::compile).collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate a request given its method, path and distinct parameter names.
    ///
    /// A path that decodes to a control character (`%0A`, `%00`, ...) never
    /// matches: the raw text would satisfy `.*` where the decoded byte would not.
    pub fn evaluate<'a>(
        &'a self,
        method: &Method,
        path: &str,
        params: &'a BTreeSet<String>,
    ) -> Decision<'a> {
        if has_control_char(path) {
            return Decision::NoMatch;
        }

        let Some(rule) = self
            .rules
            .iter()
            .find(|rule| rule.matches_structure(method, path))
        else {
            return Decision::NoMatch;
        };

        let permitted = rule.permitted_params();
        if permitted.len() != params.len() {
            return Decision::Denied {
                rule: rule.name(),
                reason: DenyReason::ParamCount {
                    permitted: permitted.len(),
                    given: params.len(),
                },
            };
        }

        if let Some(name) = params.iter().find(|name| !permitted.contains(*name)) {
            return Decision::Denied {
                rule: rule.name(),
                reason: DenyReason::ParamNotPermitted(name),
            };
        }

        Decision::Allowed { rule: rule.name() }
    }

    pub fn is_authorized(&self, method: &Method, path: &str, params: &BTreeSet<String>) -> bool {
        self.evaluate(method, path, params).is_allowed()
    }
}

/// True if the path holds a control character, raw or percent-encoded.
fn has_control_char(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.iter().any(u8::is_ascii_control)
        || bytes.windows(3).any(|w| {
            w[0] == b'%'
                && matches!(
                    (hex_value(w[1]), hex_value(w[2])),
                    (Some(hi), Some(lo)) if (hi << 4 | lo).is_ascii_control()
                )
        })
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Distinct, percent-decoded query parameter names of a request target.
pub fn query_param_names(uri: &Uri) -> BTreeSet<String> {
    uri.query()
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(name, _)| name.into_owned())
                .collect()
        })
        .unwrap_or_default()
}
