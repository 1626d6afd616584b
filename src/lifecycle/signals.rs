//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGTERM and SIGINT before the first blocking phase
//! - Translate them into `TerminationSignal` events on the `Shutdown` channel
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers only matter until handoff: `exec` resets caught signals to
//!   their default disposition, so the server installs its own
//! - SIGHUP is left alone; gunicorn uses it for reloads

use std::fmt;

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// A signal that asks the entrypoint to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGTERM (`docker stop`).
    Terminate,
}

impl TerminationSignal {
    /// POSIX signal number.
    pub fn number(&self) -> i32 {
        match self {
            TerminationSignal::Interrupt => 2,
            TerminationSignal::Terminate => 15,
        }
    }

    /// The same signal, for delivery to another process.
    #[cfg(unix)]
    pub fn as_nix(&self) -> nix::sys::signal::Signal {
        match self {
            TerminationSignal::Interrupt => nix::sys::signal::Signal::SIGINT,
            TerminationSignal::Terminate => nix::sys::signal::Signal::SIGTERM,
        }
    }

    /// Conventional shell exit code for a process ended by this signal.
    pub fn exit_code(&self) -> u8 {
        128 + self.number() as u8
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::Interrupt => f.write_str("SIGINT"),
            TerminationSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Install signal handlers and forward every signal to `shutdown`.
///
/// Registration happens before this returns, so a signal delivered right
/// after the call is not lost.
#[cfg(unix)]
pub fn spawn_listener(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = terminate.recv() => TerminationSignal::Terminate,
                Some(()) = interrupt.recv() => TerminationSignal::Interrupt,
                else => break,
            };
            tracing::warn!(signal = %received, "Termination signal received");
            shutdown.trigger(received);
        }
    }))
}

/// Install signal handlers and forward every signal to `shutdown`.
#[cfg(not(unix))]
pub fn spawn_listener(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(signal = %TerminationSignal::Interrupt, "Termination signal received");
            shutdown.trigger(TerminationSignal::Interrupt);
        }
    }))
}
