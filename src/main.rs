//! Container entrypoint for the API service.
//!
//! # Startup Sequence
//!
//! ```text
//!   ENV / --config ──▶ config (defaults < file < env < --role)
//!                          │
//!                          ▼
//!                  readiness wait (DATABASE_URL, REDIS_URL, extras)
//!                          │
//!                          ▼
//!              manage.py migrate ─▶ collectstatic ─▶ extra commands
//!                          │
//!                          ▼
//!          exec gunicorn (web) / celery worker / celery beat
//! ```
//!
//! `plan` prints the resolved sequence as JSON without running it.
//! `wait` stops after the readiness step.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use app_entrypoint::config::{self, Env, ObservabilityConfig, Role};
use app_entrypoint::observability::init_logging;
use app_entrypoint::{EntrypointError, Startup};

#[derive(Parser)]
#[command(name = "entrypoint")]
#[command(about = "Wait for dependencies, prepare the Django project, start the server", long_about = None)]
#[command(version)]
struct Cli {
    /// Optional TOML file with settings; environment variables override it
    #[arg(short, long, global = true, env = "ENTRYPOINT_CONFIG")]
    config: Option<PathBuf>,

    /// Process role (web, worker, beat); overrides ENTRYPOINT_ROLE
    #[arg(short, long, global = true)]
    role: Option<Role>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run the full startup sequence and hand off to the server (default)
    Run,
    /// Print the resolved startup plan as JSON
    Plan,
    /// Only wait for dependencies, then exit
    Wait,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut env = Env::from_process();
    if let Some(role) = cli.role {
        env.set("ENTRYPOINT_ROLE", role.as_str());
    }

    let config = match config::load_config(cli.config.as_deref(), &env) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            let err = EntrypointError::from(e);
            tracing::error!(error = %err, "Refusing to start");
            return ExitCode::from(err.exit_code());
        }
    };

    init_logging(&config.observability);

    let startup = Startup::new(config);
    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => startup.run().await.map(|outcome| {
            tracing::info!(%outcome, "Server exited");
            outcome.exit_code()
        }),
        Commands::Plan => startup.plan().map(|plan| {
            match serde_json::to_string_pretty(&plan) {
                Ok(json) => {
                    println!("{}", json);
                    0
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to render plan");
                    1
                }
            }
        }),
        Commands::Wait => startup.wait_only().await.map(|outcomes| {
            tracing::info!(targets = outcomes.len(), "All dependencies ready");
            0
        }),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %e, exit_code = e.exit_code(), "Startup aborted");
            ExitCode::from(e.exit_code())
        }
    }
}
