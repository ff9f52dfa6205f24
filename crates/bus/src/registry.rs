use std::collections::HashMap;
use std::sync::Arc;

use cinerail_types::api::WsEvent;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

type ShowtimeChannels = Arc<RwLock<HashMap<String, mpsc::Sender<WsEvent>>>>;

/// Tracks live subscriber channels per showtime. Each showtime gets
/// its own lock so a burst of connects/disconnects on one showtime
/// never contends with another; mutations under each lock stay short.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    showtimes: Arc<RwLock<HashMap<Uuid, ShowtimeChannels>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn channels_for(&self, showtime_id: Uuid) -> ShowtimeChannels {
        if let Some(channels) = self.showtimes.read().await.get(&showtime_id) {
            return channels.clone();
        }
        self.showtimes
            .write()
            .await
            .entry(showtime_id)
            .or_insert_with(|| Arc::new(RwLock::new(HashMap::new())))
            .clone()
    }

    /// Registers a subscriber's personal outbound channel (used for
    /// direct replies: pong, heartbeat_ack, error).
    pub async fn register(&self, showtime_id: Uuid, session_id: String, sender: mpsc::Sender<WsEvent>) {
        let channels = self.channels_for(showtime_id).await;
        channels.write().await.insert(session_id, sender);
    }

    pub async fn unregister(&self, showtime_id: Uuid, session_id: &str) {
        let channels = self.channels_for(showtime_id).await;
        channels.write().await.remove(session_id);
    }

    /// Sends directly to one session's channel. Returns `false` if the
    /// session isn't registered or its channel is gone.
    pub async fn send_personal(&self, showtime_id: Uuid, session_id: &str, event: WsEvent) -> bool {
        let channels = self.channels_for(showtime_id).await;
        let sender = channels.read().await.get(session_id).cloned();
        match sender {
            Some(sender) => sender.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Sends to every registered session on a showtime, optionally
    /// skipping one (the originator of the change).
    pub async fn broadcast(&self, showtime_id: Uuid, event: WsEvent, exclude_session: Option<&str>) {
        let channels = self.channels_for(showtime_id).await;
        let senders = channels.read().await;
        for (session_id, sender) in senders.iter() {
            if Some(session_id.as_str()) == exclude_session {
                continue;
            }
            let _ = sender.try_send(event.clone());
        }
    }

    pub async fn count(&self, showtime_id: Uuid) -> usize {
        self.channels_for(showtime_id).await.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinerail_types::enums::EventType;

    fn evt(showtime_id: Uuid) -> WsEvent {
        WsEvent::new(EventType::Ping, showtime_id, serde_json::json!({}))
    }

    #[tokio::test]
    async fn register_and_count() {
        let registry = SessionRegistry::new();
        let showtime = Uuid::new_v4();
        let (tx, _rx) = mpsc::channel(4);
        registry.register(showtime, "s1".into(), tx).await;
        assert_eq!(registry.count(showtime).await, 1);
        registry.unregister(showtime, "s1").await;
        assert_eq!(registry.count(showtime).await, 0);
    }

    #[tokio::test]
    async fn broadcast_excludes_originator() {
        let registry = SessionRegistry::new();
        let showtime = Uuid::new_v4();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        registry.register(showtime, "s1".into(), tx1).await;
        registry.register(showtime, "s2".into(), tx2).await;

        registry.broadcast(showtime, evt(showtime), Some("s1")).await;

        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
    }
}
