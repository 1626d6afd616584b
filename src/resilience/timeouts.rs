//! Deadline bookkeeping.
//!
//! # Responsibilities
//! - Track one overall deadline for a multi-step wait
//! - Cap individual attempt timeouts and sleeps to the time left
//!
//! # Design Decisions
//! - Uses Tokio's clock so paused-time tests stay deterministic
//! - Running out of time is reported by the caller as its own error kind

use std::time::Duration;

use tokio::time::Instant;

/// A fixed point in time after which a wait gives up.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    /// Start counting now.
    pub fn after(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left, or `None` once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.limit
            .checked_sub(self.elapsed())
            .filter(|left| !left.is_zero())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_none()
    }

    /// Clamp `wanted` so it does not run past the deadline.
    pub fn cap(&self, wanted: Duration) -> Duration {
        self.remaining().map_or(Duration::ZERO, |left| wanted.min(left))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn remaining_shrinks_with_time() {
        let deadline = Deadline::after(Duration::from_secs(10));
        assert_eq!(deadline.remaining(), Some(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(deadline.remaining(), Some(Duration::from_secs(6)));
        assert_eq!(deadline.cap(Duration::from_secs(30)), Duration::from_secs(6));
        assert_eq!(deadline.cap(Duration::from_secs(1)), Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(deadline.is_expired());
        assert_eq!(deadline.cap(Duration::from_secs(1)), Duration::ZERO);
    }
}
