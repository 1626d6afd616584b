//! Shutdown coordination for the entrypoint.

use tokio::sync::broadcast;

use crate::lifecycle::signals::TerminationSignal;

/// Coordinator for early termination.
///
/// Provides a broadcast channel that every blocking phase (dependency wait,
/// setup step, supervised server) subscribes to.
#[derive(Clone)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<TerminationSignal>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(4);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<TerminationSignal> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self, signal: TerminationSignal) {
        let _ = self.tx.send(signal);
    }

    /// Get the number of active subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
