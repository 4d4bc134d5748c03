//! Inbound and outbound API keys.
//!
//! Secrets are read from the environment once at startup and never
//! written to the config file or to logs.

use std::collections::HashMap;
use std::env;
use std::fmt;

/// Environment variable holding the real upstream key (required).
pub const ENV_OVERWRITE_APIKEY: &str = "OVERWRITE_APIKEY";
/// Environment variable holding the key callers must present (optional).
pub const ENV_DUMMY_APIKEY: &str = "DUMMY_APIKEY";
/// Inbound key used when `DUMMY_APIKEY` is unset.
pub const DEFAULT_DUMMY_APIKEY: &str = "DUMMY_APIKEY";

/// Source of environment variables.
///
/// # Thread Safety
///
/// Does **not** require `Send + Sync`; credentials are loaded once on the
/// startup path.
pub trait ReadEnv {
    fn var(&self, key: &str) -> Result<String, env::VarError>;
}

/// Delegates to `std::env`.
pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    #[inline]
    fn var(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }
}

/// Fixed set of variables, for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MapEnv(HashMap<String, String>);

impl MapEnv {
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl ReadEnv for MapEnv {
    fn var(&self, key: &str) -> Result<String, env::VarError> {
        self.0.get(key).cloned().ok_or(env::VarError::NotPresent)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("need {0}")]
pub struct MissingSecret(pub &'static str);

/// The key pair swapped by the gateway.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    inbound: String,
    outbound: String,
}

impl ProxyCredentials {
    pub fn new(inbound: impl Into<String>, outbound: impl Into<String>) -> Self {
        Self {
            inbound: inbound.into(),
            outbound: outbound.into(),
        }
    }

    /// Load from the environment.
    ///
    /// Empty values are treated as unset.
    pub fn from_env<E: ReadEnv>(env: &E) -> Result<Self, MissingSecret> {
        let outbound = non_empty(env, ENV_OVERWRITE_APIKEY)
            .ok_or(MissingSecret(ENV_OVERWRITE_APIKEY))?;
        let inbound = non_empty(env, ENV_DUMMY_APIKEY)
            .unwrap_or_else(|| DEFAULT_DUMMY_APIKEY.to_string());

        Ok(Self { inbound, outbound })
    }

    /// Key callers must present.
    pub fn inbound(&self) -> &str {
        &self.inbound
    }

    /// Key sent upstream.
    pub fn outbound(&self) -> &str {
        &self.outbound
    }
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("inbound", &"<redacted>")
            .field("outbound", &"<redacted>")
            .finish()
    }
}

fn non_empty<E: ReadEnv>(env: &E, key: &str) -> Option<String> {
    env.var(key).ok().filter(|v| !v.is_empty())
}
