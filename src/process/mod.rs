//! External process plumbing shared by setup steps and the server handoff.

pub mod command;
pub mod exit;

pub use command::CommandSpec;
pub use exit::ExitOutcome;

use std::io;

/// Shell convention for a program that could not be started.
pub fn spawn_failure_code(error: &io::Error) -> u8 {
    match error.kind() {
        io::ErrorKind::NotFound => 127,
        _ => 126,
    }
}
