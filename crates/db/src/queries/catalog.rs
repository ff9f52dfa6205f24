use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Seat, Showtime};
use cinerail_types::{AppError, Result};

pub async fn find_showtime(pool: &PgPool, id: Uuid) -> Result<Showtime> {
    sqlx::query_as::<_, Showtime>(
        "SELECT id, movie_title, room_name, starts_at, base_price FROM showtimes WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("showtime {id}")))
}

pub async fn find_seat(pool: &PgPool, id: Uuid) -> Result<Seat> {
    sqlx::query_as::<_, Seat>(
        "SELECT id, showtime_id, row_label, seat_number, seat_type FROM seats WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("seat {id}")))
}

pub async fn list_seats_for_showtime(pool: &PgPool, showtime_id: Uuid) -> Result<Vec<Seat>> {
    let seats = sqlx::query_as::<_, Seat>(
        r#"
        SELECT id, showtime_id, row_label, seat_number, seat_type
        FROM seats
        WHERE showtime_id = $1
        ORDER BY row_label, seat_number
        "#,
    )
    .bind(showtime_id)
    .fetch_all(pool)
    .await?;

    Ok(seats)
}
