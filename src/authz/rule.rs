//! Compiled authorization rules.
//!
//! # Responsibilities
//! - Compile a `RuleConfig` into a regex path matcher, method and parameter set
//! - Answer the structural question (path + method)
//! - Answer the parameter question (exact name-set equality)
//!
//! # Design Decisions
//! - Patterns carry their own anchors (`^...$`); nothing is added implicitly
//! - Methods compare exactly once parsed
//! - Only parameter names are considered, never values

use std::collections::BTreeSet;

use axum::http::Method;
use regex::Regex;

use crate::config::RuleConfig;

/// Error raised while compiling a rule definition.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("rule `{name}`: invalid path pattern: {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },
    #[error("rule `{name}`: invalid method `{method}`")]
    Method { name: String, method: String },
    #[error("rule `{name}`: parameter `{param}` listed more than once")]
    DuplicateParam { name: String, param: String },
}

/// An immutable (path, method, permitted parameters) allowlist entry.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    path: Regex,
    method: Method,
    params: BTreeSet<String>,
}

impl Rule {
    /// Compile a rule definition.
    ///
    /// The method is upper-cased before parsing so `post` and `POST` name the
    /// same rule.
    pub fn compile(config: &RuleConfig) -> Result<Self, RuleError> {
        let path = Regex::new(&config.path).map_err(|source| RuleError::Pattern {
            name: config.name.clone(),
            source,
        })?;

        let method = Method::from_bytes(config.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| RuleError::Method {
                name: config.name.clone(),
                method: config.method.clone(),
            })?;

        let mut params = BTreeSet::new();
        for param in &config.params {
            if !params.insert(param.clone()) {
                return Err(RuleError::DuplicateParam {
                    name: config.name.clone(),
                    param: param.clone(),
                });
            }
        }

        Ok(Self {
            name: config.name.clone(),
            path,
            method,
            params,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &str {
        self.path.as_str()
    }

    pub fn permitted_params(&self) -> &BTreeSet<String> {
        &self.params
    }

    /// True when both the path pattern and the method match.
    pub fn matches_structure(&self, method: &Method, path: &str) -> bool {
        self.method == method && self.path.is_match(path)
    }
}
