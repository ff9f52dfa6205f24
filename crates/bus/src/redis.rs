//! Optional multi-node backend for the event bus: for multi-node
//! deployments it is backed by a pub-sub channel keyed by showtime-id.
//!
//! Each node keeps its own [`LocalBus`] for in-process fan-out and
//! mirrors every publish onto a Redis channel so sibling nodes can
//! replay it into their own `LocalBus`. A `node_id` tag on the wire
//! envelope stops a node from re-delivering its own publish to itself
//! when the forwarder task echoes it back.

use std::sync::Arc;

use cinerail_types::api::WsEvent;
use futures::StreamExt;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::local::{LocalBus, Subscription};

const CHANNEL_PREFIX: &str = "cinerail:seats:";

#[derive(Serialize, Deserialize)]
struct Envelope {
    node_id: Uuid,
    event: WsEvent,
}

pub struct RedisBus {
    local: LocalBus,
    client: redis::Client,
    node_id: Uuid,
}

impl RedisBus {
    pub fn new(redis_url: &str) -> anyhow::Result<Arc<Self>> {
        let client = redis::Client::open(redis_url)?;
        Ok(Arc::new(Self { local: LocalBus::new(), client, node_id: Uuid::new_v4() }))
    }

    pub fn publish(&self, showtime_id: Uuid, event: WsEvent) {
        // Deliver to this node's own subscribers immediately; the bus
        // never blocks a publisher waiting on the network.
        self.local.publish(showtime_id, event.clone());

        let client = self.client.clone();
        let node_id = self.node_id;
        tokio::spawn(async move {
            let envelope = Envelope { node_id, event };
            let Ok(payload) = serde_json::to_string(&envelope) else { return };
            let channel = format!("{CHANNEL_PREFIX}{showtime_id}");
            match client.get_multiplexed_async_connection().await {
                Ok(mut conn) => {
                    if let Err(e) = conn.publish::<_, _, ()>(channel, payload).await {
                        tracing::warn!(error = %e, "redis bus publish failed");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "redis bus connection failed"),
            }
        });
    }

    pub fn subscribe(&self, showtime_id: Uuid) -> Subscription {
        self.local.subscribe(showtime_id)
    }

    /// Runs forever, replaying remote publishes into this node's
    /// `LocalBus`. Spawn once at startup; safe to restart.
    pub async fn run_forwarder(self: Arc<Self>) -> anyhow::Result<()> {
        let pattern = format!("{CHANNEL_PREFIX}*");
        let conn = self.client.get_async_connection().await?;
        let mut pubsub = conn.into_pubsub();
        pubsub.psubscribe(&pattern).await?;
        let mut stream = pubsub.on_message();

        while let Some(msg) = stream.next().await {
            let channel: String = msg.get_channel_name().to_string();
            let Some(id_str) = channel.strip_prefix(CHANNEL_PREFIX) else { continue };
            let Ok(showtime_id) = Uuid::parse_str(id_str) else { continue };
            let Ok(payload) = msg.get_payload::<String>() else { continue };
            let Ok(envelope) = serde_json::from_str::<Envelope>(&payload) else { continue };

            if envelope.node_id == self.node_id {
                continue; // already delivered locally at publish time
            }
            self.local.publish(showtime_id, envelope.event);
        }

        Ok(())
    }
}
