//! Unifies the two C3 backends behind one handle so callers (the
//! reservation service, payment orchestrator, ticket issuer, and the
//! standalone reaper binary) don't need to know whether they're
//! talking to an in-process [`LocalBus`] or a Redis-backed
//! [`RedisBus`]: single-node deployments get an in-memory multiplexer,
//! multi-node ones are backed by a cache's pub/sub primitive.
//!
//! The reaper runs as its own OS process (a separate `api`/`jobs`
//! binary split), so its sweep-expiry publishes only
//! reach the API process's WebSocket subscribers when both sides are
//! wired to the same `RedisBus`. `EventBus::Local` remains available
//! for single-binary/dev/test setups where nothing crosses a process
//! boundary.

use std::sync::Arc;

use cinerail_types::api::WsEvent;
use uuid::Uuid;

use crate::local::{LocalBus, Subscription};
use crate::redis::RedisBus;

#[derive(Clone)]
pub enum EventBus {
    Local(LocalBus),
    Redis(Arc<RedisBus>),
}

impl EventBus {
    pub fn local() -> Self {
        Self::Local(LocalBus::new())
    }

    pub fn redis(redis_url: &str) -> anyhow::Result<Self> {
        Ok(Self::Redis(RedisBus::new(redis_url)?))
    }

    pub fn publish(&self, showtime_id: Uuid, event: WsEvent) {
        match self {
            Self::Local(bus) => bus.publish(showtime_id, event),
            Self::Redis(bus) => bus.publish(showtime_id, event),
        }
    }

    pub fn subscribe(&self, showtime_id: Uuid) -> Subscription {
        match self {
            Self::Local(bus) => bus.subscribe(showtime_id),
            Self::Redis(bus) => bus.subscribe(showtime_id),
        }
    }

    /// Spawns the Redis-replay forwarder task when this handle is
    /// backed by Redis; a no-op for `Local`. Safe to call once at
    /// startup from any binary that holds an `EventBus`.
    pub fn spawn_forwarder(&self) {
        if let Self::Redis(bus) = self {
            let bus = bus.clone();
            tokio::spawn(async move {
                if let Err(e) = bus.run_forwarder().await {
                    tracing::error!(error = %e, "redis bus forwarder exited");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinerail_types::enums::EventType;

    #[tokio::test]
    async fn local_variant_delivers_published_events() {
        let bus = EventBus::local();
        let showtime = Uuid::new_v4();
        let mut sub = bus.subscribe(showtime);

        bus.publish(showtime, WsEvent::new(EventType::Ping, showtime, serde_json::json!({})));

        assert!(sub.recv().await.is_some());
    }
}
