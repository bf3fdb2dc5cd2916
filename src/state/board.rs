use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Name-tagged JSON payload fanned out to board subscribers.
#[derive(Debug, Clone)]
pub struct BoardEvent {
    /// Event name, e.g. `phase_changed`.
    pub event: String,
    /// Serialized payload.
    pub data: String,
}

impl BoardEvent {
    /// Convenience wrapper that serialises `payload` into the data field.
    pub fn json<T>(event: &str, payload: &T) -> serde_json::Result<Self>
    where
        T: Serialize,
    {
        Ok(Self {
            event: event.to_string(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// Broadcast hub carrying board-state notifications to UI adapters.
///
/// Fire-and-forget from the engine's perspective: sends never block and a
/// send with no subscribers is not an error.
pub struct BoardHub {
    sender: broadcast::Sender<BoardEvent>,
}

impl BoardHub {
    /// Construct a hub backed by a Tokio broadcast channel with the given
    /// capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.sender.subscribe()
    }

    /// Subscribe as a [`tokio_stream::Stream`] of events.
    pub fn stream(&self) -> BroadcastStream<BoardEvent> {
        BroadcastStream::new(self.subscribe())
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: BoardEvent) {
        let _ = self.sender.send(event);
    }
}
