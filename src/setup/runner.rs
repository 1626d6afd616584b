//! Fail-fast execution of setup steps.

use std::io;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::lifecycle::signals::TerminationSignal;
use crate::process::{spawn_failure_code, CommandSpec, ExitOutcome};

/// Errors from a setup step. Any of them aborts startup.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{step}: failed to start '{program}': {source}")]
    Spawn {
        step: String,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{step} failed with {outcome}")]
    Failed { step: String, outcome: ExitOutcome },

    #[error("{step} interrupted by {signal}")]
    Interrupted {
        step: String,
        signal: TerminationSignal,
    },

    #[error("{step}: lost track of child process: {source}")]
    Wait {
        step: String,
        #[source]
        source: io::Error,
    },
}

impl SetupError {
    /// Name of the step that failed.
    pub fn step(&self) -> &str {
        match self {
            SetupError::Spawn { step, .. }
            | SetupError::Failed { step, .. }
            | SetupError::Interrupted { step, .. }
            | SetupError::Wait { step, .. } => step,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            SetupError::Spawn { source, .. } => spawn_failure_code(source),
            SetupError::Failed { outcome, .. } => outcome.exit_code(),
            SetupError::Interrupted { signal, .. } => signal.exit_code(),
            SetupError::Wait { .. } => 1,
        }
    }
}

/// A completed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub label: String,
    pub elapsed_ms: u64,
}

/// Run one step to completion with inherited stdio.
pub async fn run_step(
    step: &CommandSpec,
    shutdown: &mut broadcast::Receiver<TerminationSignal>,
) -> Result<StepReport, SetupError> {
    let started = Instant::now();
    tracing::info!(step = %step.label, command = %step, "Running setup step");

    let mut child = step.to_tokio().spawn().map_err(|source| SetupError::Spawn {
        step: step.label.clone(),
        program: step.program.clone(),
        source,
    })?;

    let status = tokio::select! {
        status = child.wait() => status.map_err(|source| SetupError::Wait {
            step: step.label.clone(),
            source,
        })?,
        Ok(signal) = shutdown.recv() => {
            tracing::warn!(step = %step.label, signal = %signal, "Stopping setup step");
            let _ = child.start_kill();
            let _ = child.wait().await;
            return Err(SetupError::Interrupted {
                step: step.label.clone(),
                signal,
            });
        }
    };

    let outcome = ExitOutcome::from_status(status);
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if !outcome.success() {
        tracing::error!(step = %step.label, %outcome, elapsed_ms, "Setup step failed");
        return Err(SetupError::Failed {
            step: step.label.clone(),
            outcome,
        });
    }

    tracing::info!(step = %step.label, elapsed_ms, "Setup step finished");
    Ok(StepReport {
        label: step.label.clone(),
        elapsed_ms,
    })
}

/// Run steps in order, stopping at the first failure.
pub async fn run_steps(
    steps: &[CommandSpec],
    shutdown: &mut broadcast::Receiver<TerminationSignal>,
) -> Result<Vec<StepReport>, SetupError> {
    let mut reports = Vec::with_capacity(steps.len());
    for step in steps {
        reports.push(run_step(step, shutdown).await?);
    }
    Ok(reports)
}
