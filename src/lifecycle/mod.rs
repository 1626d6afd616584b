//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Wait for dependencies → Setup steps → server.rs command → handoff.rs
//!
//! Handoff (handoff.rs):
//!     exec: process image replaced, entrypoint gone
//!     supervise: spawn → wait → mirror exit status
//!
//! Signals (signals.rs) → Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → abort wait or setup, stop supervised server
//! ```
//!
//! # Design Decisions
//! - Ordered startup: dependencies first, then schema, then assets, then server
//! - Any failure before handoff exits non-zero; no partial state survives
//! - Signal handlers are installed before the first blocking step

pub mod handoff;
pub mod server;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use handoff::HandoffError;
pub use shutdown::Shutdown;
pub use signals::TerminationSignal;
pub use startup::{Startup, StartupPlan};
