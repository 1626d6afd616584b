//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde and the env loader handle syntax)
//! - Validate value ranges (workers > 0, timeouts > 0, backoff bounds)
//! - Check that every dependency descriptor resolves to a wait target
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EntrypointConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::EntrypointConfig;
use crate::readiness::target::WaitTarget;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a fully-merged configuration.
pub fn validate_config(config: &EntrypointConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let server = &config.server;
    if server.workers == 0 {
        errors.push(ValidationError::new("server.workers", "must be at least 1"));
    }
    if server.timeout_secs == 0 {
        errors.push(ValidationError::new("server.timeout_secs", "must be at least 1"));
    }
    if server.program.trim().is_empty() {
        errors.push(ValidationError::new("server.program", "must not be empty"));
    }
    if server.wsgi_app.trim().is_empty() {
        errors.push(ValidationError::new("server.wsgi_app", "must not be empty"));
    }
    for arg in &server.extra_args {
        if let Some(flag) = managed_server_flag(arg) {
            errors.push(ValidationError::new(
                "server.extra_args",
                format!("'{}' overrides {}, which is set by the entrypoint", arg, flag),
            ));
        }
    }

    let readiness = &config.readiness;
    if readiness.enabled && readiness.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "readiness.timeout_secs",
            "must be at least 1 while the wait is enabled",
        ));
    }
    if readiness.connect_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "readiness.connect_timeout_ms",
            "must be greater than 0",
        ));
    }
    if readiness.base_delay_ms == 0 {
        errors.push(ValidationError::new(
            "readiness.base_delay_ms",
            "must be greater than 0",
        ));
    }
    if readiness.base_delay_ms > readiness.max_delay_ms {
        errors.push(ValidationError::new(
            "readiness.max_delay_ms",
            format!(
                "must not be smaller than base_delay_ms ({})",
                readiness.base_delay_ms
            ),
        ));
    }

    if let Some(url) = &config.database_url {
        if let Err(e) = WaitTarget::from_database_url(url) {
            errors.push(ValidationError::new("database_url", e.to_string()));
        }
    }
    if let Some(url) = &readiness.redis_url {
        if let Err(e) = WaitTarget::from_redis_url(url) {
            errors.push(ValidationError::new("readiness.redis_url", e.to_string()));
        }
    }
    for raw in &readiness.extra_targets {
        if let Err(e) = WaitTarget::parse(raw) {
            errors.push(ValidationError::new("readiness.extra_targets", e.to_string()));
        }
    }

    let setup = &config.setup;
    if setup.python.trim().is_empty() {
        errors.push(ValidationError::new("setup.python", "must not be empty"));
    }
    if setup.manage_script.trim().is_empty() {
        errors.push(ValidationError::new("setup.manage_script", "must not be empty"));
    }
    if setup.extra_commands.iter().any(|c| c.trim().is_empty()) {
        errors.push(ValidationError::new(
            "setup.extra_commands",
            "entries must not be empty",
        ));
    }

    let worker = &config.worker;
    if config.role.needs_broker() {
        if worker.program.trim().is_empty() {
            errors.push(ValidationError::new("worker.program", "must not be empty"));
        }
        if worker.app.trim().is_empty() {
            errors.push(ValidationError::new("worker.app", "must not be empty"));
        }
    }
    if worker.concurrency == Some(0) {
        errors.push(ValidationError::new("worker.concurrency", "must be at least 1"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Gunicorn options the entrypoint always sets itself.
const MANAGED_SERVER_FLAGS: &[(&str, &str)] =
    &[("-b", "--bind"), ("-w", "--workers"), ("-t", "--timeout")];

/// The managed long flag `arg` would set, in any spelling gunicorn accepts
/// (`--bind`, `--bind=x`, `-b`, `-bx`).
fn managed_server_flag(arg: &str) -> Option<&'static str> {
    let arg = arg.trim();
    MANAGED_SERVER_FLAGS.iter().find_map(|&(short, long)| {
        let long_form = arg == long || arg.starts_with(&format!("{}=", long));
        let short_form = !arg.starts_with("--") && arg.starts_with(short);
        (long_form || short_form).then_some(long)
    })
}
