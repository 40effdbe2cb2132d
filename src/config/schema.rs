//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every field has a default so an empty file is a valid configuration.

use std::collections::BTreeMap;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::resilience::policy::{self, RetryPolicy};

/// Name under which the `[retry]` table can be requested explicitly.
pub const DEFAULT_POLICY_NAME: &str = "default";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Policy used when no profile is named.
    pub retry: RetryConfig,

    /// Named policy profiles, e.g. `[policies.http]`.
    pub policies: BTreeMap<String, RetryConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ExecutorConfig {
    /// Resolve a profile by name; `None` or `"default"` selects `[retry]`.
    ///
    /// Returns `None` for an unknown name. The result is not validated.
    pub fn policy(&self, name: Option<&str>) -> Option<RetryPolicy> {
        match name {
            None | Some(DEFAULT_POLICY_NAME) => Some(self.retry.to_policy(DEFAULT_POLICY_NAME)),
            Some(name) => self.policies.get(name).map(|cfg| cfg.to_policy(name)),
        }
    }
}

/// Retry policy as written in a config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,

    /// Base delay of the backoff sequence in milliseconds.
    pub initial_delay_ms: u64,

    /// Ceiling on the computed delay in milliseconds.
    pub max_delay_ms: u64,

    /// Growth factor per retry.
    pub factor: f64,

    /// Add up to 10% random delay.
    pub jitter: bool,

    /// Label for logs and metrics. Defaults to the profile name.
    pub description: Option<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: policy::DEFAULT_MAX_RETRIES,
            initial_delay_ms: policy::DEFAULT_INITIAL_DELAY.as_millis() as u64,
            max_delay_ms: policy::DEFAULT_MAX_DELAY.as_millis() as u64,
            factor: policy::DEFAULT_FACTOR,
            jitter: true,
            description: None,
        }
    }
}

impl RetryConfig {
    /// Convert to a policy, labelling it `fallback_description` when unnamed.
    pub fn to_policy(&self, fallback_description: &str) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            factor: self.factor,
            jitter: self.jitter,
            description: self
                .description
                .clone()
                .unwrap_or_else(|| fallback_description.to_string()),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Record retry metrics through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: ExecutorConfig = toml::from_str("").unwrap();
        let policy = config.policy(None).unwrap();
        assert_eq!(policy, RetryPolicy::new(DEFAULT_POLICY_NAME));
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_named_profile_inherits_field_defaults() {
        let config: ExecutorConfig = toml::from_str(
            r#"
            [policies.http]
            max_retries = 5
            jitter = false

            [policies.db]
            description = "database query"
            "#,
        )
        .unwrap();

        let http = config.policy(Some("http")).unwrap();
        assert_eq!(http.max_retries, 5);
        assert!(!http.jitter);
        assert_eq!(http.initial_delay, Duration::from_millis(200));
        assert_eq!(http.description, "http");

        let db = config.policy(Some("db")).unwrap();
        assert_eq!(db.description, "database query");

        assert!(config.policy(Some("missing")).is_none());
        assert!(config.policy(Some("default")).is_some());
    }

    #[test]
    fn test_to_policy_converts_without_validating() {
        let cfg = RetryConfig {
            initial_delay_ms: 0,
            factor: 0.5,
            ..RetryConfig::default()
        };
        let policy = cfg.to_policy("broken");
        assert_eq!(policy.description, "broken");
        assert_eq!(policy.initial_delay, Duration::ZERO);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_log_format_parses_lowercase() {
        let config: ExecutorConfig = toml::from_str(
            r#"
            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
