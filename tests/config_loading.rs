//! Loading policies from TOML files and running them.

use std::io::Write;
use std::time::Duration;

use resilient_exec::config::{load_config, ConfigError, LogFormat};
use resilient_exec::resilience::Executor;

mod common;
use common::{ms, Flaky, RecordingObserver};

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"
        [retry]
        max_retries = 2
        initial_delay_ms = 50
        max_delay_ms = 1000
        factor = 3.0
        jitter = false
        description = "default outbound"

        [policies.http]
        max_retries = 5
        initial_delay_ms = 100

        [policies.database]
        max_retries = 1
        jitter = false

        [observability]
        log_level = "debug"
        log_format = "json"
        metrics_enabled = true
        "#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.observability.log_format, LogFormat::Json);
    assert!(config.observability.metrics_enabled);

    let default = config.policy(None).unwrap();
    assert_eq!(default.max_retries, 2);
    assert_eq!(default.initial_delay, ms(50));
    assert_eq!(default.factor, 3.0);
    assert_eq!(default.description, "default outbound");

    let http = config.policy(Some("http")).unwrap();
    assert_eq!(http.max_retries, 5);
    assert_eq!(http.max_delay, Duration::from_millis(5000));

    let db = config.policy(Some("database")).unwrap();
    assert_eq!(db.description, "database");
    assert!(!db.jitter);
}

#[test]
fn test_invalid_profiles_are_all_reported() {
    let file = write_config(
        r#"
        [policies.a]
        factor = 0.5

        [policies.b]
        initial_delay_ms = 0
        "#,
    );

    match load_config(file.path()) {
        Err(ConfigError::Validation(errors)) => {
            let fields: Vec<_> = errors.iter().map(|e| e.field.clone()).collect();
            assert_eq!(fields, vec!["policies.a", "policies.b"]);
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_loaded_policy_drives_executor() {
    let file = write_config(
        r#"
        [policies.fast]
        max_retries = 3
        initial_delay_ms = 10
        max_delay_ms = 30
        jitter = false
        "#,
    );
    let config = load_config(file.path()).unwrap();
    let executor = Executor::new(config.policy(Some("fast")).unwrap()).unwrap();
    let flaky = Flaky::always_failing();
    let recorder = RecordingObserver::default();

    let err = executor
        .call(|attempt| flaky.attempt(attempt))
        .observe(&recorder)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.attempts(), 4);
    assert_eq!(recorder.retry_delays(), vec![ms(20), ms(30), ms(30)]);
}
