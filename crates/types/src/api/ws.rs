use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::enums::{EventType, SeatType};

/// Envelope sent down every `/ws/seats/{showtime_id}` connection.
///
/// `data` is intentionally loose JSON rather than an enum of payload
/// structs: each `EventType` carries a different shape and clients only
/// ever branch on `event_type`, so a flattened payload struct per
/// variant would just duplicate that branch on the Rust side too.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export, export_to = "../../../frontend/src/lib/types/")]
pub struct WsEvent {
    pub event_type: EventType,
    pub showtime_id: Uuid,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl WsEvent {
    pub fn new(event_type: EventType, showtime_id: Uuid, data: serde_json::Value) -> Self {
        Self { event_type, showtime_id, data, timestamp: Utc::now() }
    }
}

/// One row of the seat snapshot sent as `InitialData` on connect.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export, export_to = "../../../frontend/src/lib/types/")]
pub struct SeatSnapshot {
    pub seat_id: Uuid,
    pub seat_type: SeatType,
    pub held: bool,
    pub sold: bool,
    pub held_by_session: Option<String>,
}

/// Messages a client may send over an already-open seat-map socket.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    Heartbeat,
    ReserveSeat { seat_id: Uuid, session_id: String },
}
