use std::time::Duration as StdDuration;

use chrono::Duration;
use cinerail_bus::EventBus;
use cinerail_db::queries::{catalog, holds, tickets};
use cinerail_db::queries::holds::NewHold;
use cinerail_db::Pool;
use cinerail_types::api::{HoldResponse, SeatSnapshot, WsEvent};
use cinerail_types::enums::EventType;
use cinerail_types::{AppError, Result};
use uuid::Uuid;

/// One item of a bulk reservation request, already validated to belong
/// to the same showtime as its siblings.
#[derive(Debug, Clone)]
pub struct ReserveItem {
    pub showtime_id: Uuid,
    pub seat_id: Uuid,
    pub session_id: String,
    pub user_id: Option<Uuid>,
}

/// Reservation service, mirroring a
/// `booking::create`/`booking::cancel` module shape: explicit pool
/// parameter, a single transaction per call, typed `AppError` returns.
/// Generalizes slot-counting booking logic to per-seat
/// hold semantics.
#[derive(Clone)]
pub struct ReservationService {
    pool: Pool,
    bus: EventBus,
    hold_ttl: Duration,
}

impl ReservationService {
    pub fn new(pool: Pool, bus: EventBus, hold_ttl: StdDuration) -> Self {
        Self {
            pool,
            bus,
            hold_ttl: Duration::from_std(hold_ttl).unwrap_or(Duration::minutes(10)),
        }
    }

    /// Reserves a single seat, creating a pending hold.
    pub async fn reserve(
        &self,
        showtime_id: Uuid,
        seat_id: Uuid,
        session_id: &str,
        user_id: Option<Uuid>,
    ) -> Result<HoldResponse> {
        catalog::find_showtime(&self.pool, showtime_id).await?;
        catalog::find_seat(&self.pool, seat_id).await?;

        let hold = holds::try_create(
            &self.pool,
            NewHold { showtime_id, seat_id, session_id: session_id.to_string(), user_id },
            self.hold_ttl,
        )
        .await?;

        let response = HoldResponse::from(&hold);

        self.bus.publish(
            showtime_id,
            WsEvent::new(
                EventType::SeatsReserved,
                showtime_id,
                serde_json::json!({ "seat_ids": [seat_id], "user_session": session_id }),
            ),
        );

        Ok(response)
    }

    /// Reserves several seats as one all-or-nothing operation. All
    /// items must share one showtime; the caller (route handler) is
    /// responsible for that grouping before calling in.
    pub async fn reserve_bulk(&self, items: Vec<ReserveItem>) -> Result<Vec<HoldResponse>> {
        let Some(first) = items.first() else {
            return Ok(Vec::new());
        };
        let showtime_id = first.showtime_id;
        if items.iter().any(|i| i.showtime_id != showtime_id) {
            return Err(AppError::BadRequest("bulk reservation items must share one showtime".into()));
        }

        catalog::find_showtime(&self.pool, showtime_id).await?;
        for item in &items {
            catalog::find_seat(&self.pool, item.seat_id).await?;
        }

        let new_holds: Vec<NewHold> = items
            .iter()
            .map(|i| NewHold {
                showtime_id: i.showtime_id,
                seat_id: i.seat_id,
                session_id: i.session_id.clone(),
                user_id: i.user_id,
            })
            .collect();

        let created = holds::try_create_bulk(&self.pool, new_holds, self.hold_ttl).await?;
        let responses: Vec<HoldResponse> = created.iter().map(HoldResponse::from).collect();

        let seat_ids: Vec<Uuid> = created.iter().map(|h| h.seat_id).collect();
        let session_id = items[0].session_id.clone();
        let event = WsEvent::new(
            EventType::SeatsReserved,
            showtime_id,
            serde_json::json!({ "seat_ids": seat_ids, "user_session": session_id }),
        );
        self.bus.publish(showtime_id, event);

        Ok(responses)
    }

    /// Cancels this session's holds on the given seats. Seats that were
    /// already free are a silent no-op (cancellation is idempotent); a
    /// seat still held live by a *different* session is a 403.
    pub async fn cancel(&self, showtime_id: Uuid, seat_ids: &[Uuid], session_id: &str) -> Result<Vec<Uuid>> {
        let released = holds::cancel_by_owner(&self.pool, showtime_id, seat_ids, session_id).await?;

        let unreleased: Vec<Uuid> = seat_ids.iter().copied().filter(|s| !released.contains(s)).collect();
        if !unreleased.is_empty() {
            let still_live = holds::live_for_seats(&self.pool, showtime_id, &unreleased).await?;
            if still_live.iter().any(|h| h.session_id != session_id) {
                return Err(AppError::Forbidden);
            }
        }

        if !released.is_empty() {
            let event = WsEvent::new(
                EventType::SeatReleased,
                showtime_id,
                serde_json::json!({ "seat_ids": released, "reason": "user_cancelled" }),
            );
            self.bus.publish(showtime_id, event);
        }

        Ok(released)
    }

    /// Live holds for a showtime, used for initial subscriber sync.
    pub async fn snapshot(&self, showtime_id: Uuid) -> Result<Vec<HoldResponse>> {
        let holds = holds::list_live_for_showtime(&self.pool, showtime_id).await?;
        Ok(holds.iter().map(HoldResponse::from).collect())
    }

    /// Full per-seat snapshot sent as a new WebSocket subscriber's
    /// `initial_data` event: every seat in the room, tagged with
    /// whichever of held/sold applies.
    pub async fn seat_map(&self, showtime_id: Uuid) -> Result<Vec<SeatSnapshot>> {
        catalog::find_showtime(&self.pool, showtime_id).await?;
        let seats = catalog::list_seats_for_showtime(&self.pool, showtime_id).await?;
        let live_holds = holds::list_live_for_showtime(&self.pool, showtime_id).await?;
        let sold_ids = tickets::list_sold_seat_ids_for_showtime(&self.pool, showtime_id).await?;

        Ok(seats
            .into_iter()
            .map(|seat| {
                let hold = live_holds.iter().find(|h| h.seat_id == seat.id);
                SeatSnapshot {
                    seat_id: seat.id,
                    seat_type: seat.seat_type.parse().unwrap_or_default(),
                    held: hold.is_some(),
                    sold: sold_ids.contains(&seat.id),
                    held_by_session: hold.map(|h| h.session_id.clone()),
                }
            })
            .collect())
    }
}
