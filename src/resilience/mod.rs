//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Dependency probe:
//!     → timeouts.rs (overall deadline, per-attempt cap)
//!     → On failure: backoff.rs (exponential delay with jitter)
//!     → Deadline passed: caller fails fast with a distinct error
//! ```
//!
//! # Design Decisions
//! - Every wait has a deadline; nothing blocks forever
//! - Only readiness probes are retried; setup steps never are
//! - Jittered backoff avoids replicas probing in lockstep

pub mod backoff;
pub mod timeouts;

pub use backoff::{calculate_backoff, BackoffPolicy};
pub use timeouts::Deadline;
