use thiserror::Error;

use crate::config::ConfigError;
use crate::lifecycle::handoff::HandoffError;
use crate::lifecycle::signals::TerminationSignal;
use crate::readiness::{ReadinessError, TargetError};
use crate::setup::SetupError;

/// Exit code for an unusable configuration (sysexits `EX_CONFIG`).
pub const EXIT_CONFIG: u8 = 78;

/// Exit code for a dependency that never became ready (sysexits `EX_UNAVAILABLE`).
pub const EXIT_UNAVAILABLE: u8 = 69;

#[derive(Debug, Error)]
pub enum EntrypointError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid wait target: {0}")]
    Target(#[from] TargetError),

    #[error("dependency wait failed: {0}")]
    Readiness(#[from] ReadinessError),

    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("server handoff failed: {0}")]
    Handoff(#[from] HandoffError),

    #[error("interrupted by {0} before handoff")]
    Interrupted(TerminationSignal),

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
}

impl EntrypointError {
    /// Exit code the container should report for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            EntrypointError::Config(_) | EntrypointError::Target(_) => EXIT_CONFIG,
            EntrypointError::Readiness(ReadinessError::NotReady { .. }) => EXIT_UNAVAILABLE,
            EntrypointError::Readiness(ReadinessError::Interrupted { signal, .. }) => {
                signal.exit_code()
            }
            EntrypointError::Setup(e) => e.exit_code(),
            EntrypointError::Handoff(e) => e.exit_code(),
            EntrypointError::Interrupted(signal) => signal.exit_code(),
            EntrypointError::Signals(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, EntrypointError>;
