use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub showtime_id: Uuid,
    pub seat_id: Uuid,
    pub user_id: Option<Uuid>,
    pub price: Decimal,
    pub status: String,
    pub booking_code: String,
    pub qr_token: String,
    pub issued_at: DateTime<Utc>,
}
