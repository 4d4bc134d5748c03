//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::authz::RuleError;
use crate::config::credentials::{MissingSecret, ProxyCredentials, ReadEnv};
use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    MissingSecret(#[from] MissingSecret),
    #[error(transparent)]
    Rule(#[from] RuleError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Resolve the effective configuration: file if given, defaults otherwise.
pub fn resolve_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = GatewayConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

/// Load the key pair from the environment.
pub fn load_credentials<E: ReadEnv>(env: &E) -> Result<ProxyCredentials, ConfigError> {
    Ok(ProxyCredentials::from_env(env)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::credentials::{MapEnv, ENV_OVERWRITE_APIKEY};

    #[test]
    fn test_parse_reports_validation_errors() {
        let err = parse_config("[upstream]\nscheme = \"gopher\"\n").unwrap_err();

        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("gopher"));
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        let err = parse_config("[listener\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/authz-proxy.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_resolve_without_file_uses_defaults() {
        let config = resolve_config(None).unwrap();
        assert_eq!(config.upstream.host, "api.mackerelio.com");
    }

    #[test]
    fn test_load_credentials() {
        assert!(matches!(
            load_credentials(&MapEnv::default()),
            Err(ConfigError::MissingSecret(_))
        ));

        let env = MapEnv::default().with(ENV_OVERWRITE_APIKEY, "real");
        assert_eq!(load_credentials(&env).unwrap().outbound(), "real");
    }
}
