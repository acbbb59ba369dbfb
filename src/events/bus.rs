//! In-process event bus: a `tokio::sync::broadcast` fan-out consumed by the
//! external HTTP/WebSocket surface (spec §6 push channel, §9 "Event-emitter
//! relationships").

use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::ArbitrageOpportunity;
use crate::execution::ExecutionResult;

const CHANNEL_CAPACITY: usize = 1024;

/// One push-channel message. Mirrors the `{type, data}` envelope of spec §6.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    ArbitrageOpportunity(ArbitrageOpportunity),
    ExecutionSuccess(ExecutionResult),
    ExecutionFailed(ExecutionResult),
    Error(String),
}

/// Broadcasts engine events to every current subscriber. Publishing never
/// blocks on a slow subscriber; a lagging receiver drops old messages
/// instead of slowing down the Detector or Coordinator (spec §5 backpressure).
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. A send with no subscribers is not an error; it is
    /// only logged at debug volume by the caller's discretion, not here.
    pub fn publish(&self, event: EngineEvent) {
        if self.sender.send(event).is_err() {
            warn!("event bus has no active subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
