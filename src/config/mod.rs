//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! environment
//!     → credentials.rs (OVERWRITE_APIKEY, DUMMY_APIKEY)
//!     → ProxyCredentials (immutable)
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup and never reloaded
//! - All fields have defaults to allow minimal configs
//! - Secrets only come from the environment
//! - Validation separates syntactic (serde) from semantic checks

pub mod credentials;
pub mod loader;
pub mod schema;
pub mod validation;

pub use credentials::{MapEnv, ProxyCredentials, ReadEnv, SystemEnv};
pub use loader::{load_config, load_credentials, resolve_config, ConfigError};
pub use schema::{
    GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig, RuleConfig, TimeoutConfig,
    UpstreamConfig,
};
