//! Dependency readiness subsystem.
//!
//! # Data Flow
//! ```text
//! EntrypointConfig
//!     → target.rs (DATABASE_URL / REDIS_URL / ENTRYPOINT_WAIT_FOR → WaitTarget)
//!     → waiter.rs (loop until ready or deadline)
//!         → probe.rs (one TCP connect or HTTP GET)
//!         → resilience::backoff (delay before next attempt)
//! ```
//!
//! # Design Decisions
//! - Probes connect to the real endpoint instead of sleeping blindly
//! - One overall deadline; running out is a distinct error, never a silent pass
//! - Targets without a network endpoint (sqlite, sockets) are skipped

pub mod probe;
pub mod target;
pub mod waiter;

pub use probe::ProbeError;
pub use target::{ProbeKind, TargetError, WaitTarget};
pub use waiter::{ReadinessError, ReadinessWaiter, WaitOutcome, WaitPolicy};

use crate::config::EntrypointConfig;

/// Collect the wait targets implied by the configuration, in probe order.
///
/// Database first, then the Celery broker for roles that need it, then any
/// explicit extra targets.
pub fn collect_targets(config: &EntrypointConfig) -> Result<Vec<WaitTarget>, TargetError> {
    let mut targets = Vec::new();
    if !config.readiness.enabled {
        return Ok(targets);
    }

    if let Some(url) = &config.database_url {
        match WaitTarget::from_database_url(url)? {
            Some(target) => targets.push(target),
            None => tracing::info!(
                scheme = descriptor_scheme(url),
                "Database descriptor has no probeable endpoint, skipping wait"
            ),
        }
    }

    if config.role.needs_broker() {
        if let Some(url) = &config.readiness.redis_url {
            if let Some(target) = WaitTarget::from_redis_url(url)? {
                targets.push(target);
            }
        }
    }

    for raw in &config.readiness.extra_targets {
        targets.push(WaitTarget::parse(raw)?);
    }

    Ok(targets)
}

/// Scheme of a descriptor, safe to log.
fn descriptor_scheme(url: &str) -> &str {
    url.split_once("://").map_or("", |(scheme, _)| scheme)
}
