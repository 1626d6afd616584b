//! Container entrypoint for the API Django project.
//!
//! Waits for the database (and broker, for Celery roles), runs migrations
//! and static collection, then hands the process to gunicorn or celery.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod process;
pub mod readiness;
pub mod resilience;
pub mod setup;

pub use config::EntrypointConfig;
pub use error::{EntrypointError, Result};
pub use lifecycle::{Startup, StartupPlan};
