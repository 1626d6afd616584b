//! Process handoff to the long-running server.
//!
//! # Responsibilities
//! - `Exec`: replace the process image; PID and signal routing go to the server
//! - `Supervise`: spawn the server, forward termination signals, mirror its exit
//!
//! # Design Decisions
//! - Exec is the default wherever the platform has it
//! - Exec only returns on failure, so success has no value to carry
//! - Supervised exit status is mirrored, signals included (128 + n)

use std::io;

use thiserror::Error;
use tokio::process::Child;
use tokio::sync::broadcast;

use crate::config::HandoffMode;
use crate::lifecycle::signals::TerminationSignal;
use crate::process::{spawn_failure_code, CommandSpec, ExitOutcome};

/// Errors while transferring control to the server.
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("failed to exec '{program}': {source}")]
    Exec {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("lost track of '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl HandoffError {
    pub fn exit_code(&self) -> u8 {
        match self {
            HandoffError::Exec { source, .. } | HandoffError::Spawn { source, .. } => {
                spawn_failure_code(source)
            }
            HandoffError::Wait { .. } => 1,
        }
    }
}

/// Hand the process over to `cmd`.
///
/// With [`HandoffMode::Exec`] on Unix this only returns on failure.
pub async fn handoff(
    cmd: &CommandSpec,
    mode: HandoffMode,
    shutdown: &mut broadcast::Receiver<TerminationSignal>,
) -> Result<ExitOutcome, HandoffError> {
    match mode {
        #[cfg(unix)]
        HandoffMode::Exec => Err(exec(cmd)),
        #[cfg(not(unix))]
        HandoffMode::Exec => {
            tracing::warn!("exec handoff unavailable on this platform, supervising instead");
            supervise(cmd, shutdown).await
        }
        HandoffMode::Supervise => supervise(cmd, shutdown).await,
    }
}

/// Replace the current process image with `cmd`.
///
/// Returns only if the exec itself failed.
#[cfg(unix)]
pub fn exec(cmd: &CommandSpec) -> HandoffError {
    use std::os::unix::process::CommandExt;

    tracing::info!(program = %cmd.program, command = %cmd, "Handing off process");
    let source = cmd.to_std().exec();
    tracing::error!(program = %cmd.program, error = %source, "exec failed");
    HandoffError::Exec {
        program: cmd.program.clone(),
        source,
    }
}

/// Run `cmd` as a child and mirror its exit outcome.
///
/// Termination signals are forwarded to the child, which decides how to shut
/// down; the reported outcome is the child's own.
pub async fn supervise(
    cmd: &CommandSpec,
    shutdown: &mut broadcast::Receiver<TerminationSignal>,
) -> Result<ExitOutcome, HandoffError> {
    let mut child = cmd.to_tokio().spawn().map_err(|source| HandoffError::Spawn {
        program: cmd.program.clone(),
        source,
    })?;

    tracing::info!(
        program = %cmd.program,
        pid = child.id().unwrap_or_default(),
        command = %cmd,
        "Server started under supervision"
    );

    loop {
        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|source| HandoffError::Wait {
                    program: cmd.program.clone(),
                    source,
                })?;
                let outcome = ExitOutcome::from_status(status);
                tracing::info!(program = %cmd.program, %outcome, "Server exited");
                return Ok(outcome);
            }
            Ok(signal) = shutdown.recv() => {
                tracing::warn!(program = %cmd.program, %signal, "Forwarding signal to server");
                if let Err(e) = forward_signal(&mut child, signal) {
                    tracing::warn!(program = %cmd.program, %signal, error = %e, "Failed to signal server");
                }
            }
        }
    }
}

#[cfg(unix)]
fn forward_signal(child: &mut Child, signal: TerminationSignal) -> io::Result<()> {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // Already reaped: the next wait() reports the exit.
    let Some(pid) = child.id() else {
        return Ok(());
    };
    kill(Pid::from_raw(pid as i32), signal.as_nix()).map_err(io::Error::from)
}

#[cfg(not(unix))]
fn forward_signal(child: &mut Child, _signal: TerminationSignal) -> io::Result<()> {
    child.start_kill()
}
