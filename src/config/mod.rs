//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → optional TOML file (--config / ENTRYPOINT_CONFIG)
//!     → loader.rs (environment overrides)
//!     → validation.rs (semantic checks)
//!     → EntrypointConfig (validated, immutable)
//!     → handed to lifecycle::Startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; no step reads the environment itself
//! - All fields have defaults so an empty environment is a valid config
//! - Empty environment values count as unset
//! - Validation reports every problem, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, Env};
pub use schema::{
    EntrypointConfig, HandoffMode, LogFormat, ObservabilityConfig, ReadinessConfig, Role,
    ServerConfig, SetupConfig, WorkerConfig, SERVER_BIND_HOST, SERVER_PORT,
};
pub use validation::{validate_config, ValidationError};
