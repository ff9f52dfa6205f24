//! Reaper: periodically expires stale pending holds and republishes
//! their release. Runs as its own standalone jobs binary
//! pattern (one `main.rs` per background-task process) but hand-rolled
//! as a plain `tokio::time::sleep` loop rather than `tokio_cron_scheduler`
//! — a fixed-cadence cron job can't express the *dynamic* cadence this
//! needs (30s normally, 60s for exactly one cycle after an error).
//!
//! The reaper owns no state of its own; restarting it is safe, but more
//! than one instance must never run concurrently (holds would be swept
//! twice). Call `run_forever` from a single binary instance.

use std::time::Duration;

use chrono::Utc;
use cinerail_bus::EventBus;
use cinerail_db::queries::holds;
use cinerail_db::Pool;
use cinerail_types::api::WsEvent;
use cinerail_types::enums::EventType;
use cinerail_types::Result;
use std::collections::HashMap;
use uuid::Uuid;

/// Normal tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(30);
/// Backoff applied to the next cycle only, after an unexpected error.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(60);

/// One sweep cycle: expires every pending hold whose TTL has lapsed and
/// publishes a `seat_released` event (reason "expired") per showtime.
pub async fn tick(pool: &Pool, bus: &EventBus) -> Result<usize> {
    let expired = holds::sweep_expired(pool, Utc::now()).await?;
    if expired.is_empty() {
        return Ok(0);
    }

    let mut by_showtime: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for hold in &expired {
        by_showtime.entry(hold.showtime_id).or_default().push(hold.seat_id);
    }

    for (showtime_id, seat_ids) in &by_showtime {
        bus.publish(
            *showtime_id,
            WsEvent::new(
                EventType::SeatReleased,
                *showtime_id,
                serde_json::json!({ "seat_ids": seat_ids, "reason": "expired" }),
            ),
        );
    }

    Ok(expired.len())
}

/// Runs forever at `TICK_PERIOD`, backing off to `ERROR_BACKOFF` for
/// the cycle immediately following an unexpected error. Never returns;
/// intended to be the whole body of a reaper process's `main`.
pub async fn run_forever(pool: Pool, bus: EventBus) -> ! {
    let mut next_sleep = TICK_PERIOD;
    loop {
        tokio::time::sleep(next_sleep).await;

        match tick(&pool, &bus).await {
            Ok(0) => next_sleep = TICK_PERIOD,
            Ok(released) => {
                tracing::info!(released, "reaper: released expired holds");
                next_sleep = TICK_PERIOD;
            }
            Err(e) => {
                tracing::error!(error = %e, "reaper: sweep failed, backing off for one cycle");
                next_sleep = ERROR_BACKOFF;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_constants_are_30s_and_60s() {
        assert_eq!(TICK_PERIOD, Duration::from_secs(30));
        assert_eq!(ERROR_BACKOFF, Duration::from_secs(60));
    }
}
