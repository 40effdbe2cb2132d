//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every policy profile produces a growing, bounded backoff
//! - Validate observability values
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ExecutorConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::{ExecutorConfig, DEFAULT_POLICY_NAME};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `policies.http`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ExecutorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.retry.to_policy(DEFAULT_POLICY_NAME).validate() {
        errors.push(ValidationError::new("retry", e.to_string()));
    }

    for (name, retry) in &config.policies {
        if name == DEFAULT_POLICY_NAME {
            errors.push(ValidationError::new(
                format!("policies.{}", name),
                "name is reserved for the [retry] table",
            ));
            continue;
        }
        if let Err(e) = retry.to_policy(name).validate() {
            errors.push(ValidationError::new(format!("policies.{}", name), e.to_string()));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!(
                "unknown level '{}', expected one of {}",
                config.observability.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
