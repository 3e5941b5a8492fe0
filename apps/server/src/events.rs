use ballotwatch_core::broadcast::BroadcastChannel;
use serde_json::Value;
use tokio::sync::broadcast;

/// Envelope carrying an event name, an optional room, and its payload.
///
/// Events without a room go to every subscriber. Events with a room go only
/// to subscribers that joined it.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    pub name: &'static str,
    pub room: Option<String>,
    pub payload: Value,
}

impl ServerEvent {
    pub fn global(name: &'static str, payload: Value) -> Self {
        Self {
            name,
            room: None,
            payload,
        }
    }

    pub fn to_room(room: impl Into<String>, name: &'static str, payload: Value) -> Self {
        Self {
            name,
            room: Some(room.into()),
            payload,
        }
    }

    /// Whether a subscriber that joined `room` (or none) should see this event.
    pub fn is_visible_to(&self, room: Option<&str>) -> bool {
        match &self.room {
            None => true,
            Some(target) => room == Some(target.as_str()),
        }
    }
}

/// Lightweight broadcast bus that fans out events to any connected clients.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn publish(&self, event: ServerEvent) {
        // No subscribers is not an error; lagging listeners skip ahead.
        let _ = self.sender.send(event);
    }
}

impl BroadcastChannel for EventBus {
    fn emit(&self, event: &'static str, payload: Value) {
        self.publish(ServerEvent::global(event, payload));
    }

    fn emit_to(&self, room: &str, event: &'static str, payload: Value) {
        self.publish(ServerEvent::to_room(room, event, payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_room_visibility() {
        let global = ServerEvent::global("prediction:update", json!({}));
        let scoped = ServerEvent::to_room("E1", "prediction:update", json!({}));

        assert!(global.is_visible_to(None));
        assert!(global.is_visible_to(Some("E1")));
        assert!(scoped.is_visible_to(Some("E1")));
        assert!(!scoped.is_visible_to(Some("E2")));
        assert!(!scoped.is_visible_to(None));
    }

    #[tokio::test]
    async fn test_channel_emissions_reach_subscribers() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.emit_to("E1", "prediction:update", json!({ "p": 1 }));
        bus.emit("prediction:update", json!({ "electionId": "E1" }));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.room.as_deref(), Some("E1"));
        assert_eq!(first.payload, json!({ "p": 1 }));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.room, None);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new(8);
        bus.emit("prediction:update", json!(null));
        assert_eq!(bus.subscriber_count(), 0);
    }
}
