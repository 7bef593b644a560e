//! Lifecycle events of the bootstrapper.
//!
//! Components emit events via [`EventBus::emit`] and subscribe via
//! [`EventBus::subscribe`]. Built on [`tokio::sync::broadcast`] so
//! multiple listeners can react independently.

use tokio::sync::broadcast;

/// Milestones of a bootstrap, in the order they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The engine handle was constructed and its converter bound.
    EngineReady { theme: String, languages: Vec<String> },
    /// The converter was bound in the shared globals.
    ConverterRegistered { symbol: String },
    /// The host callback was invoked after `ticks` scheduler ticks.
    HostSignalled { symbol: String, ticks: usize },
}

/// A broadcast channel that any component can emit to or subscribe from.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    /// Returns the number of receivers that will see it.
    pub fn emit(&self, event: Event) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events. Returns a receiver that yields all
    /// future events (does not replay past ones).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(16)
    }
}
