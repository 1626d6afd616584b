//! Child exit status mapping.

use std::fmt;
use std::process::ExitStatus;

use serde::Serialize;

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitOutcome {
    Code(i32),
    Signal(i32),
}

impl ExitOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signal(signal);
            }
        }

        ExitOutcome::Code(1)
    }

    pub fn success(&self) -> bool {
        matches!(self, ExitOutcome::Code(0))
    }

    /// Exit code to report for this outcome.
    ///
    /// Failures never map to 0, even when the low byte of the code is 0.
    pub fn exit_code(&self) -> u8 {
        match *self {
            ExitOutcome::Code(0) => 0,
            ExitOutcome::Code(code) => match (code & 0xff) as u8 {
                0 => 1,
                byte => byte,
            },
            ExitOutcome::Signal(signal) => (128 + signal).clamp(129, 255) as u8,
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Code(code) => write!(f, "exit code {}", code),
            ExitOutcome::Signal(signal) => write!(f, "signal {}", signal),
        }
    }
}
