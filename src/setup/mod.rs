//! Setup subsystem.
//!
//! # Data Flow
//! ```text
//! EntrypointConfig
//!     → plan.rs (migrate → collectstatic → extra management commands)
//!     → runner.rs (spawn, wait, inspect exit status; stop at first failure)
//! ```
//!
//! # Design Decisions
//! - Steps never retry; a failed migration must not reach the server
//! - Tool output is inherited untouched; only exit status is inspected
//! - A termination signal kills the running step and aborts startup

pub mod plan;
pub mod runner;

pub use plan::{setup_steps, SETTINGS_MODULE_ENV};
pub use runner::{run_step, run_steps, SetupError, StepReport};
