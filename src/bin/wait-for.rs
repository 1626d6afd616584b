//! Standalone readiness probe.
//!
//! Waits until every TARGET accepts connections, then exits 0 or, when a
//! command follows `--`, replaces itself with that command.
//!
//! ```text
//! wait-for db:5432 redis://cache:6379/0 -- celery -A API worker
//! ```

use std::process::ExitCode;

use clap::Parser;

use app_entrypoint::config::{HandoffMode, LogFormat, ObservabilityConfig, ReadinessConfig};
use app_entrypoint::lifecycle::handoff::handoff;
use app_entrypoint::lifecycle::{signals, Shutdown};
use app_entrypoint::observability::init_logging;
use app_entrypoint::process::CommandSpec;
use app_entrypoint::readiness::{ReadinessWaiter, WaitPolicy, WaitTarget};
use app_entrypoint::EntrypointError;

#[derive(Parser)]
#[command(name = "wait-for")]
#[command(about = "Block until TCP/HTTP targets are reachable", long_about = None)]
#[command(version)]
struct Cli {
    /// Overall budget in seconds shared by all targets
    #[arg(short, long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Upper bound for a single connection attempt, in milliseconds
    #[arg(long, default_value_t = 2000, value_parser = clap::value_parser!(u64).range(1..))]
    connect_timeout_ms: u64,

    /// Log level for this tool
    #[arg(long, env = "ENTRYPOINT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format (pretty or json)
    #[arg(long, env = "ENTRYPOINT_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,

    /// host:port, tcp://host:port, http(s):// URL or a service URL
    #[arg(required = true, value_name = "TARGET")]
    targets: Vec<String>,

    /// Command to exec once every target is ready
    #[arg(last = true, value_name = "CMD")]
    command: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&ObservabilityConfig {
        log_level: cli.log_level.clone(),
        log_format: cli.log_format,
    });

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %e, exit_code = e.exit_code(), "wait-for failed");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<u8, EntrypointError> {
    let targets = cli
        .targets
        .iter()
        .map(|raw| WaitTarget::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let readiness = ReadinessConfig {
        timeout_secs: cli.timeout,
        connect_timeout_ms: cli.connect_timeout_ms,
        ..ReadinessConfig::default()
    };

    let shutdown = Shutdown::new();
    let mut signals_rx = shutdown.subscribe();
    let listener = signals::spawn_listener(shutdown.clone()).map_err(EntrypointError::Signals)?;

    let waiter = ReadinessWaiter::new(WaitPolicy::from(&readiness));
    let outcomes = waiter.wait_all(&targets, &mut signals_rx).await?;
    tracing::info!(targets = outcomes.len(), "All targets ready");

    let Some((program, args)) = cli.command.split_first() else {
        listener.abort();
        return Ok(0);
    };

    let cmd = CommandSpec::new("command", program.as_str()).args(args.iter().cloned());
    let outcome = handoff(&cmd, HandoffMode::default(), &mut signals_rx).await?;
    listener.abort();
    Ok(outcome.exit_code())
}
