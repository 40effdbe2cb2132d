//! resilient-exec command line tool.
//!
//! Runs a command or fetches a URL under a retry policy loaded from a TOML
//! file, and can print the delay schedule a policy produces.
//!
//! # Exit Codes
//! - 0: the operation succeeded
//! - 1: the operation failed (exhausted or non-retryable)
//! - 2: invalid configuration or arguments
//! - 130: interrupted with Ctrl-C

use std::fmt::Display;
use std::io;
use std::path::PathBuf;
use std::process::{ExitCode, ExitStatus};
use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;

use resilient_exec::config::{load_config, ConfigError, ExecutorConfig};
use resilient_exec::lifecycle::{signals, CancelSignal};
use resilient_exec::observability::{init_logging, MetricsObserver, TracingObserver};
use resilient_exec::resilience::backoff::{apply_jitter, Backoff};
use resilient_exec::resilience::timeouts::{with_timeout, TimeoutError};
use resilient_exec::resilience::{Executor, RetryError, RetryPolicy, SeededJitter};

#[derive(Parser)]
#[command(name = "resilient-exec")]
#[command(about = "Run unreliable operations with exponential backoff", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Named policy profile from the configuration
    #[arg(short, long, global = true)]
    policy: Option<String>,

    /// Override the number of retries
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Disable jitter
    #[arg(long, global = true)]
    no_jitter: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command, retrying while it exits unsuccessfully
    Exec {
        /// Kill and retry an attempt that runs longer than this
        #[arg(long)]
        attempt_timeout_ms: Option<u64>,

        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// GET a URL, retrying connection errors, 429 and 5xx responses
    Fetch {
        url: String,

        /// Per-request timeout
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
    },
    /// Print the delays the policy produces, as JSON
    Schedule {
        /// Number of delays to print (defaults to the policy's retries)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Seed for jitter; without it the un-jittered delays are printed
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Debug, Error)]
enum CommandError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn { program: String, source: io::Error },

    #[error("exited with {0}")]
    Status(ExitStatus),
}

impl CommandError {
    /// A missing or non-executable program will not appear on retry.
    fn is_retryable(&self) -> bool {
        match self {
            CommandError::Spawn { source, .. } => !matches!(
                source.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
            ),
            CommandError::Status(_) => true,
        }
    }
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded {0}")]
    Status(StatusCode),
}

impl FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Request(e) => !e.is_builder() && !e.is_redirect(),
            FetchError::Status(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(2);
            }
        },
        None => ExecutorConfig::default(),
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("Warning: logging not initialized: {}", e);
    }

    let policy = match resolve_policy(&config, &cli) {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    tracing::debug!(
        policy = %policy.description,
        max_retries = policy.max_retries,
        initial_delay_ms = policy.initial_delay.as_millis() as u64,
        max_delay_ms = policy.max_delay.as_millis() as u64,
        factor = policy.factor,
        jitter = policy.jitter,
        "Policy resolved"
    );

    let metrics_enabled = config.observability.metrics_enabled;
    match cli.command {
        Commands::Exec { attempt_timeout_ms, command } => {
            run_exec(policy, command, attempt_timeout_ms.map(Duration::from_millis), metrics_enabled)
                .await
        }
        Commands::Fetch { url, timeout_ms } => {
            run_fetch(policy, url, Duration::from_millis(timeout_ms), metrics_enabled).await
        }
        Commands::Schedule { count, seed } => print_schedule(&policy, count, seed),
    }
}

fn resolve_policy(config: &ExecutorConfig, cli: &Cli) -> Result<RetryPolicy, ConfigError> {
    let mut policy = config
        .policy(cli.policy.as_deref())
        .ok_or_else(|| ConfigError::UnknownPolicy(cli.policy.clone().unwrap_or_default()))?;

    if let Some(max_retries) = cli.max_retries {
        policy.max_retries = max_retries;
    }
    if cli.no_jitter {
        policy.jitter = false;
    }
    Ok(policy)
}

async fn run_exec(
    policy: RetryPolicy,
    command: Vec<String>,
    attempt_timeout: Option<Duration>,
    metrics_enabled: bool,
) -> ExitCode {
    let executor = match Executor::new(policy) {
        Ok(executor) => executor,
        Err(e) => {
            eprintln!("Error: invalid retry policy: {}", e);
            return ExitCode::from(2);
        }
    };
    let cancel = CancelSignal::new();
    let _ctrl_c = signals::cancel_on_ctrl_c(cancel.clone());

    let (program, args) = match command.split_first() {
        Some(split) => split,
        None => return ExitCode::from(2),
    };
    // Far enough out to mean "no deadline" without overflowing the timer.
    let limit = attempt_timeout.unwrap_or(Duration::from_secs(60 * 60 * 24 * 365));

    let mut call = executor
        .call(|attempt| with_timeout(limit, run_once(program, args, attempt)))
        .observe(TracingObserver)
        .retry_if(|e: &TimeoutError<CommandError>| match e {
            TimeoutError::Elapsed(_) => true,
            TimeoutError::Inner(inner) => inner.is_retryable(),
        })
        .cancel_on(&cancel);
    if metrics_enabled {
        call = call.observe(MetricsObserver);
    }

    report(call.run().await)
}

async fn run_fetch(policy: RetryPolicy, url: String, timeout: Duration, metrics_enabled: bool) -> ExitCode {
    let executor = match Executor::new(policy) {
        Ok(executor) => executor,
        Err(e) => {
            eprintln!("Error: invalid retry policy: {}", e);
            return ExitCode::from(2);
        }
    };
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };
    let cancel = CancelSignal::new();
    let _ctrl_c = signals::cancel_on_ctrl_c(cancel.clone());

    let mut call = executor
        .call(|_attempt| fetch_once(&client, &url))
        .observe(TracingObserver)
        .retry_if(FetchError::is_retryable)
        .cancel_on(&cancel);
    if metrics_enabled {
        call = call.observe(MetricsObserver);
    }

    let result = call.run().await;
    if let Ok(body) = &result {
        print!("{}", body);
    }
    report(result)
}

fn print_schedule(policy: &RetryPolicy, count: Option<usize>, seed: Option<u64>) -> ExitCode {
    if let Err(e) = policy.validate() {
        eprintln!("Error: invalid retry policy: {}", e);
        return ExitCode::from(2);
    }

    let count = count.unwrap_or(policy.max_retries as usize);
    let jitter = seed.filter(|_| policy.jitter).map(SeededJitter::new);

    let delays: Vec<_> = Backoff::new(policy)
        .take(count)
        .enumerate()
        .map(|(i, capped)| {
            let actual = match &jitter {
                Some(source) => apply_jitter(capped, source),
                None => capped,
            };
            json!({
                "before_attempt": i + 2,
                "capped_ms": capped.as_secs_f64() * 1000.0,
                "delay_ms": actual.as_secs_f64() * 1000.0,
            })
        })
        .collect();

    let schedule = json!({
        "policy": policy.description,
        "max_retries": policy.max_retries,
        "jitter": policy.jitter,
        "seed": seed,
        "delays": delays,
    });

    match serde_json::to_string_pretty(&schedule) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// One run of the child process. Dropping the future kills the child.
async fn run_once(program: &str, args: &[String], attempt: u32) -> Result<(), CommandError> {
    let status = tokio::process::Command::new(program)
        .args(args)
        .env("RETRY_ATTEMPT", attempt.to_string())
        .kill_on_drop(true)
        .status()
        .await
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(CommandError::Status(status))
    }
}

async fn fetch_once(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    Ok(response.text().await?)
}

fn report<T, E: Display>(result: Result<T, RetryError<E>>) -> ExitCode {
    let code = exit_code(&result);
    match &result {
        Ok(_) => {}
        Err(e @ RetryError::Cancelled { .. }) => eprintln!("Interrupted: {}", e),
        Err(e) => eprintln!("Error: {}", e),
    }
    ExitCode::from(code)
}

fn exit_code<T, E>(result: &Result<T, RetryError<E>>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(RetryError::Cancelled { .. }) => 130,
        Err(RetryError::Config(_)) => 2,
        Err(_) => 1,
    }
}
