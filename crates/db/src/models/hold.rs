use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Row shape of the `holds` table. Status is stored as text and parsed
/// at the boundary (`cinerail_types::enums::HoldStatus::from_str`)
/// rather than mapped through a Postgres enum, the same way the
/// `payments` table's own status column works.
#[derive(Debug, Clone, FromRow)]
pub struct Hold {
    pub id: Uuid,
    pub showtime_id: Uuid,
    pub seat_id: Uuid,
    pub session_id: String,
    pub user_id: Option<Uuid>,
    pub status: String,
    pub reserved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub payment_id: Option<Uuid>,
    pub transaction_id: Option<Uuid>,
}
