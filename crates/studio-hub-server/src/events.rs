//! In-process event bus for server-side updates.
//!
//! Provides a lightweight broadcast channel for status subscriptions.

use tokio::sync::broadcast;

/// Server event payloads published by core services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    /// `current` or `pending` changed.
    QueueChanged,
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<HubEvent>,
}

impl EventBus {
    /// Create a new event bus with a bounded broadcast channel.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.sender.subscribe()
    }

    /// Notify subscribers that the queue has changed.
    pub fn queue_changed(&self) {
        let _ = self.sender.send(HubEvent::QueueChanged);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
