use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// A single showing of a film in a given room. Catalog management
/// (creating movies, rooms, showtimes) is out of scope here; this is
/// the minimal read-only shape the reservation and payment flows need.
#[derive(Debug, Clone, FromRow)]
pub struct Showtime {
    pub id: Uuid,
    pub movie_title: String,
    pub room_name: String,
    pub starts_at: DateTime<Utc>,
    pub base_price: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct Seat {
    pub id: Uuid,
    pub showtime_id: Uuid,
    pub row_label: String,
    pub seat_number: i32,
    pub seat_type: String,
}
