use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cinerail_types::api::WsEvent;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

/// Bound on a broadcast channel's internal ring buffer and on each
/// subscriber's forwarding queue.
pub const QUEUE_BOUND: usize = 64;

/// Upper bound on how long a forwarder will wait to hand a message to a
/// slow subscriber before disconnecting it.
pub const FORWARD_TIMEOUT: Duration = Duration::from_secs(5);

/// In-process, per-showtime fan-out, following a `TopicBroadcaster`
/// pattern: one `tokio::sync::broadcast` channel per key, created
/// lazily on first publish or subscribe.
///
/// `publish` never blocks on a slow subscriber: it only pushes into the
/// broadcast ring buffer. The actual backpressure policy (disconnect a
/// subscriber that hasn't drained within 5s or 64 messages) is enforced
/// per-subscriber by the forwarding task spawned in `subscribe`, which
/// decouples "how fast the bus can publish" from "how fast one socket
/// can write".
#[derive(Clone)]
pub struct LocalBus {
    channels: Arc<Mutex<HashMap<Uuid, broadcast::Sender<WsEvent>>>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self { channels: Arc::new(Mutex::new(HashMap::new())) }
    }

    fn sender_for(&self, showtime_id: Uuid) -> broadcast::Sender<WsEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(showtime_id)
            .or_insert_with(|| broadcast::channel(QUEUE_BOUND).0)
            .clone()
    }

    /// Publish an event for `showtime_id`. Non-blocking: if there are no
    /// subscribers this is a no-op, and a slow subscriber never delays
    /// the caller.
    pub fn publish(&self, showtime_id: Uuid, event: WsEvent) {
        let sender = self.sender_for(showtime_id);
        let _ = sender.send(event);
    }

    /// Subscribe to `showtime_id`. Spawns a forwarding task that applies
    /// the 5s/64-message backpressure policy; the returned `Subscription`
    /// yields `None` once the subscriber has been dropped for lag or
    /// because the bus itself is gone.
    pub fn subscribe(&self, showtime_id: Uuid) -> Subscription {
        let mut broadcast_rx = self.sender_for(showtime_id).subscribe();
        let (tx, rx) = mpsc::channel(QUEUE_BOUND);

        let handle = tokio::spawn(async move {
            loop {
                let event = match broadcast_rx.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber lagged past queue bound, disconnecting");
                        break;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                match tokio::time::timeout(FORWARD_TIMEOUT, tx.send(event)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => break, // consumer dropped
                    Err(_) => {
                        tracing::warn!("subscriber did not drain within 5s, disconnecting");
                        break;
                    }
                }
            }
        });

        Subscription { rx, _forwarder: handle }
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription to one showtime's event stream. Dropping it
/// cancels the forwarding task.
pub struct Subscription {
    rx: mpsc::Receiver<WsEvent>,
    _forwarder: tokio::task::JoinHandle<()>,
}

impl Subscription {
    /// Waits for the next event, or returns `None` if the bus dropped
    /// this subscriber (lag or 5s stall) or the bus itself is gone.
    pub async fn recv(&mut self) -> Option<WsEvent> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self._forwarder.abort();
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
    async fn delivers_in_publish_order() {
        let bus = LocalBus::new();
        let showtime = Uuid::new_v4();
        let mut sub = bus.subscribe(showtime);

        bus.publish(showtime, evt(showtime));
        bus.publish(showtime, evt(showtime));

        assert!(sub.recv().await.is_some());
        assert!(sub.recv().await.is_some());
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_a_noop() {
        let bus = LocalBus::new();
        bus.publish(Uuid::new_v4(), evt(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn lag_past_queue_bound_disconnects_subscriber() {
        let bus = LocalBus::new();
        let showtime = Uuid::new_v4();
        let mut sub = bus.subscribe(showtime);

        for _ in 0..(QUEUE_BOUND * 4) {
            bus.publish(showtime, evt(showtime));
        }

        // Give the forwarder a moment to observe the lag and exit.
        tokio::time::sleep(Duration::from_millis(50)).await;
        bus.publish(showtime, evt(showtime));

        // Drain whatever made it through; eventually the channel closes.
        let mut closed = false;
        for _ in 0..(QUEUE_BOUND * 4) {
            if sub.recv().await.is_none() {
                closed = true;
                break;
            }
        }
        assert!(closed, "lagged subscriber should eventually be disconnected");
    }
}
