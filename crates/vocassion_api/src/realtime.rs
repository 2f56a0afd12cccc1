//! Best-effort realtime fan-out for chat messages.

use log::debug;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

pub const CHAT_CHANNEL: &str = "chat-channel";
pub const NEW_MESSAGE_EVENT: &str = "new-message";

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeEvent {
    pub channel: String,
    pub event: String,
    pub payload: Value,
}

impl RealtimeEvent {
    pub fn chat_message(user_id: &str, message: &str) -> Self {
        Self {
            channel: CHAT_CHANNEL.to_string(),
            event: NEW_MESSAGE_EVENT.to_string(),
            payload: serde_json::json!({ "userId": user_id, "message": message }),
        }
    }
}

/// Publishes events to whoever is listening. Delivery is never guaranteed.
pub trait Broadcaster: Send + Sync {
    /// Returns how many subscribers received the event.
    fn publish(&self, event: RealtimeEvent) -> usize;
    /// Receiver for events published after this call.
    fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent>;
}

/// In-process broadcaster over a tokio broadcast channel.
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<RealtimeEvent>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn publish(&self, event: RealtimeEvent) -> usize {
        let channel = event.channel.clone();
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(
                    "event=realtime_publish module=realtime status=skipped channel={} reason=no_subscribers",
                    channel
                );
                0
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.sender.subscribe()
    }
}
