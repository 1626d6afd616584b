//! Bounded dependency wait.
//!
//! # Responsibilities
//! - Probe each target until it answers or the overall deadline passes
//! - Back off exponentially between attempts
//! - Abort promptly when a termination signal arrives

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{self, Instant};

use crate::config::ReadinessConfig;
use crate::lifecycle::signals::TerminationSignal;
use crate::readiness::probe::probe;
use crate::readiness::target::WaitTarget;
use crate::resilience::{BackoffPolicy, Deadline};

/// Errors from the dependency wait.
#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("{target} not ready after {attempts} attempt(s) in {waited:?}: {last_error}")]
    NotReady {
        target: String,
        attempts: u32,
        waited: Duration,
        last_error: String,
    },

    #[error("interrupted by {signal} while waiting for {target}")]
    Interrupted {
        target: String,
        signal: TerminationSignal,
    },
}

/// Limits for one dependency wait.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    /// Overall budget shared by all targets.
    pub max_wait: Duration,
    /// Upper bound for a single probe.
    pub connect_timeout: Duration,
    pub backoff: BackoffPolicy,
}

impl From<&ReadinessConfig> for WaitPolicy {
    fn from(config: &ReadinessConfig) -> Self {
        Self {
            max_wait: Duration::from_secs(config.timeout_secs),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            backoff: BackoffPolicy::from(config),
        }
    }
}

/// Result of waiting for one target.
#[derive(Debug, Clone, Serialize)]
pub struct WaitOutcome {
    pub target: String,
    pub attempts: u32,
    pub elapsed_ms: u64,
}

/// Polls dependency targets until they accept connections.
pub struct ReadinessWaiter {
    policy: WaitPolicy,
    client: reqwest::Client,
}

impl ReadinessWaiter {
    pub fn new(policy: WaitPolicy) -> Self {
        Self {
            policy,
            client: reqwest::Client::new(),
        }
    }

    /// Wait for every target in order under one shared deadline.
    ///
    /// An empty target list returns immediately.
    pub async fn wait_all(
        &self,
        targets: &[WaitTarget],
        shutdown: &mut broadcast::Receiver<TerminationSignal>,
    ) -> Result<Vec<WaitOutcome>, ReadinessError> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let deadline = Deadline::after(self.policy.max_wait);
        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            outcomes.push(self.wait_one(target, &deadline, shutdown).await?);
        }
        Ok(outcomes)
    }

    async fn wait_one(
        &self,
        target: &WaitTarget,
        deadline: &Deadline,
        shutdown: &mut broadcast::Receiver<TerminationSignal>,
    ) -> Result<WaitOutcome, ReadinessError> {
        let started = Instant::now();
        let mut attempts = 0u32;
        let mut last_error = String::from("deadline exhausted before the first probe");

        tracing::info!(
            target_name = %target.name,
            max_wait_secs = self.policy.max_wait.as_secs(),
            "Waiting for dependency"
        );

        loop {
            let attempt_timeout = deadline.cap(self.policy.connect_timeout);
            if attempt_timeout.is_zero() {
                break;
            }
            attempts += 1;

            let result = tokio::select! {
                r = probe(target, attempt_timeout, &self.client) => r,
                Ok(signal) = shutdown.recv() => {
                    return Err(ReadinessError::Interrupted {
                        target: target.name.clone(),
                        signal,
                    });
                }
            };

            match result {
                Ok(()) => {
                    let elapsed = started.elapsed();
                    tracing::info!(
                        target_name = %target.name,
                        attempts,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Dependency ready"
                    );
                    return Ok(WaitOutcome {
                        target: target.name.clone(),
                        attempts,
                        elapsed_ms: elapsed.as_millis() as u64,
                    });
                }
                Err(e) => {
                    last_error = e.to_string();
                    let delay = deadline.cap(self.policy.backoff.delay(attempts));
                    if delay.is_zero() {
                        break;
                    }
                    tracing::debug!(
                        target_name = %target.name,
                        attempt = attempts,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Dependency not ready yet"
                    );

                    tokio::select! {
                        _ = time::sleep(delay) => {}
                        Ok(signal) = shutdown.recv() => {
                            return Err(ReadinessError::Interrupted {
                                target: target.name.clone(),
                                signal,
                            });
                        }
                    }
                }
            }
        }

        let waited = started.elapsed();
        tracing::error!(
            target_name = %target.name,
            attempts,
            waited_ms = waited.as_millis() as u64,
            error = %last_error,
            "Dependency did not become ready"
        );
        Err(ReadinessError::NotReady {
            target: target.name.clone(),
            attempts,
            waited,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use tokio::net::TcpListener;

    fn policy(max_wait_ms: u64) -> WaitPolicy {
        WaitPolicy {
            max_wait: Duration::from_millis(max_wait_ms),
            connect_timeout: Duration::from_millis(200),
            backoff: BackoffPolicy {
                base_ms: 20,
                max_ms: 100,
            },
        }
    }

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test(start_paused = true)]
    async fn no_targets_means_no_delay() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        let waiter = ReadinessWaiter::new(policy(60_000));

        let before = Instant::now();
        let outcomes = waiter.wait_all(&[], &mut rx).await.unwrap();
        assert!(outcomes.is_empty());
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn ready_target_needs_one_attempt() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        let waiter = ReadinessWaiter::new(policy(2_000));
        let outcomes = waiter
            .wait_all(&[WaitTarget::tcp("127.0.0.1", port)], &mut rx)
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].attempts, 1);
    }

    #[tokio::test]
    async fn unreachable_target_fails_within_the_deadline() {
        let port = closed_port().await;
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        let waiter = ReadinessWaiter::new(policy(500));
        let started = std::time::Instant::now();
        let err = waiter
            .wait_all(&[WaitTarget::tcp("127.0.0.1", port)], &mut rx)
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(2));
        match err {
            ReadinessError::NotReady { attempts, .. } => assert!(attempts >= 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn late_dependency_is_picked_up() {
        let port = closed_port().await;
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        let server = tokio::spawn(async move {
            time::sleep(Duration::from_millis(150)).await;
            let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
            time::sleep(Duration::from_secs(3)).await;
            drop(listener);
        });

        let waiter = ReadinessWaiter::new(policy(3_000));
        let outcomes = waiter
            .wait_all(&[WaitTarget::tcp("127.0.0.1", port)], &mut rx)
            .await
            .unwrap();
        assert!(outcomes[0].attempts > 1);
        server.abort();
    }

    #[tokio::test]
    async fn termination_interrupts_the_wait() {
        let port = closed_port().await;
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(100)).await;
            trigger.trigger(TerminationSignal::Terminate);
        });

        let waiter = ReadinessWaiter::new(policy(30_000));
        let err = waiter
            .wait_all(&[WaitTarget::tcp("127.0.0.1", port)], &mut rx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReadinessError::Interrupted {
                signal: TerminationSignal::Terminate,
                ..
            }
        ));
    }
}
