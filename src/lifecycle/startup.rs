//! Startup orchestration.
//!
//! # Responsibilities
//! - Wait for dependencies named by the configuration
//! - Run setup steps in order (migrate, collectstatic, extra commands)
//! - Hand the process over to the long-running server
//!
//! # Design Decisions
//! - Fail fast: any error before handoff is fatal, nothing is retried
//! - Steps run sequentially, never concurrently
//! - The server starts last (traffic only once the schema is current)

use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;

use crate::config::{EntrypointConfig, HandoffMode, Role};
use crate::error::{EntrypointError, Result};
use crate::lifecycle::handoff::handoff;
use crate::lifecycle::server::server_command;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::{self, TerminationSignal};
use crate::process::{CommandSpec, ExitOutcome};
use crate::readiness::{collect_targets, ReadinessWaiter, WaitOutcome, WaitPolicy, WaitTarget};
use crate::setup::{run_steps, setup_steps};

/// Everything `run` would do, resolved but not executed.
#[derive(Debug, Clone, Serialize)]
pub struct StartupPlan {
    pub role: Role,
    pub handoff: HandoffMode,
    pub wait_targets: Vec<WaitTarget>,
    pub max_wait_secs: u64,
    pub setup_steps: Vec<CommandSpec>,
    pub server: CommandSpec,
}

/// The startup orchestrator.
pub struct Startup {
    config: EntrypointConfig,
    shutdown: Shutdown,
    signals: broadcast::Receiver<TerminationSignal>,
}

impl Startup {
    pub fn new(config: EntrypointConfig) -> Self {
        let shutdown = Shutdown::new();
        let signals = shutdown.subscribe();
        Self {
            config,
            shutdown,
            signals,
        }
    }

    /// Resolve the full sequence without running anything.
    pub fn plan(&self) -> Result<StartupPlan> {
        Ok(StartupPlan {
            role: self.config.role,
            handoff: self.config.handoff,
            wait_targets: collect_targets(&self.config)?,
            max_wait_secs: self.config.readiness.timeout_secs,
            setup_steps: setup_steps(&self.config),
            server: server_command(&self.config),
        })
    }

    /// Step 1: block until every dependency answers, or fail.
    ///
    /// Returns immediately when the configuration names no dependency.
    pub async fn wait_for_dependencies(&mut self) -> Result<Vec<WaitOutcome>> {
        let targets = collect_targets(&self.config)?;
        if targets.is_empty() {
            tracing::info!("No dependency descriptors, skipping wait");
            return Ok(Vec::new());
        }

        let waiter = ReadinessWaiter::new(WaitPolicy::from(&self.config.readiness));
        Ok(waiter.wait_all(&targets, &mut self.signals).await?)
    }

    /// Steps 1 through 4. Returns the server command on success.
    pub async fn prepare(&mut self) -> Result<CommandSpec> {
        self.wait_for_dependencies().await?;

        let steps = setup_steps(&self.config);
        run_steps(&steps, &mut self.signals).await?;

        Ok(server_command(&self.config))
    }

    /// Run the whole sequence and hand off to the server.
    ///
    /// Under exec handoff this does not return on success.
    pub async fn run(mut self) -> Result<ExitOutcome> {
        let listener = self.listen_for_signals()?;

        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            role = %self.config.role,
            handoff = ?self.config.handoff,
            "Entrypoint starting"
        );

        let server = self.prepare().await?;
        self.ensure_not_interrupted()?;
        let outcome = handoff(&server, self.config.handoff, &mut self.signals).await?;

        listener.abort();
        Ok(outcome)
    }

    /// Only the dependency wait, with signal handling installed.
    pub async fn wait_only(mut self) -> Result<Vec<WaitOutcome>> {
        let listener = self.listen_for_signals()?;
        let outcomes = self.wait_for_dependencies().await;
        listener.abort();
        outcomes
    }

    /// Fail if a termination signal is already queued.
    ///
    /// Covers the gap between the last setup step and handoff, where nothing
    /// is selecting on the channel.
    fn ensure_not_interrupted(&mut self) -> Result<()> {
        loop {
            match self.signals.try_recv() {
                Ok(signal) => return Err(EntrypointError::Interrupted(signal)),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return Ok(()),
            }
        }
    }

    fn listen_for_signals(&self) -> Result<JoinHandle<()>> {
        signals::spawn_listener(self.shutdown.clone()).map_err(EntrypointError::Signals)
    }
}
