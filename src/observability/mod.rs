//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! config, readiness, setup, lifecycle:
//!     → tracing events with structured fields (step, target_name, attempt, elapsed_ms)
//!     → logging.rs subscriber (pretty or JSON, stderr)
//!     → container log driver
//! ```
//!
//! # Design Decisions
//! - Structured fields so JSON output is queryable
//! - No metrics endpoint: the entrypoint is gone after handoff

pub mod logging;

pub use logging::init_logging;
