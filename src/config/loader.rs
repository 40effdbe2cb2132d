//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ExecutorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("Unknown retry policy '{0}'")]
    UnknownPolicy(String),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ExecutorConfig, ConfigError> {
    let config: ExecutorConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ExecutorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), profiles = config.policies.len(), "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            parse_config("retry = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validation_error_message_lists_fields() {
        let err = parse_config(
            r#"
            [retry]
            initial_delay_ms = 1000
            max_delay_ms = 10
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Validation failed: retry: max delay"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/resilient-exec.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
