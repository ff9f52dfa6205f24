use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::enums::HoldStatus;

/// `POST /reservations` request body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateHoldRequest {
    pub showtime_id: Uuid,
    pub seat_id: Uuid,
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    pub user_id: Option<Uuid>,
}

/// `POST /reservations/multiple` request body: one hold per seat.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateHoldBulkRequest {
    #[validate(length(min = 1, max = 32))]
    pub items: Vec<CreateHoldRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export, export_to = "../../../frontend/src/lib/types/")]
pub struct HoldResponse {
    pub id: Uuid,
    pub showtime_id: Uuid,
    pub seat_id: Uuid,
    pub session_id: String,
    pub user_id: Option<Uuid>,
    pub status: HoldStatus,
    pub reserved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub payment_id: Option<Uuid>,
    pub transaction_id: Option<Uuid>,
}

/// `DELETE /reservations/{showtime}` query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelHoldQuery {
    /// Comma-separated seat ids, e.g. `?seat_ids=1,2,3`.
    pub seat_ids: String,
    pub session_id: String,
}

impl CancelHoldQuery {
    pub fn seat_ids(&self) -> Vec<Uuid> {
        self.seat_ids
            .split(',')
            .filter_map(|s| Uuid::parse_str(s.trim()).ok())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CancelHoldResponse {
    pub released_seat_ids: Vec<Uuid>,
}
