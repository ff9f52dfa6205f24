use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction as SqlxTx};
use uuid::Uuid;

use crate::models::Ticket;
use cinerail_types::Result;

pub struct NewTicket {
    pub transaction_id: Uuid,
    pub showtime_id: Uuid,
    pub seat_id: Uuid,
    pub user_id: Option<Uuid>,
    pub price: Decimal,
    pub booking_code: String,
    pub qr_token: String,
}

const TICKET_COLUMNS: &str =
    "id, transaction_id, showtime_id, seat_id, user_id, price, status, booking_code, qr_token, issued_at";

/// Inserts one confirmed ticket per settled hold, inside the same
/// transaction that confirms the holds and finalises the
/// payment/transaction rows.
pub async fn create_many(
    tx: &mut SqlxTx<'_, Postgres>,
    tickets: &[NewTicket],
) -> Result<Vec<Ticket>> {
    let mut out = Vec::with_capacity(tickets.len());
    let query = format!(
        r#"
        INSERT INTO tickets (id, transaction_id, showtime_id, seat_id, user_id, price, status, booking_code, qr_token, issued_at)
        VALUES ($1, $2, $3, $4, $5, $6, 'confirmed', $7, $8, NOW())
        RETURNING {TICKET_COLUMNS}
        "#
    );

    for t in tickets {
        let ticket = sqlx::query_as::<_, Ticket>(&query)
            .bind(Uuid::new_v4())
            .bind(t.transaction_id)
            .bind(t.showtime_id)
            .bind(t.seat_id)
            .bind(t.user_id)
            .bind(t.price)
            .bind(&t.booking_code)
            .bind(&t.qr_token)
            .fetch_one(&mut **tx)
            .await?;

        out.push(ticket);
    }

    Ok(out)
}

/// Seat ids already sold (ticketed) for a showtime, used to build the
/// `initial_data` seat-map snapshot alongside the live-hold set.
pub async fn list_sold_seat_ids_for_showtime(pool: &PgPool, showtime_id: Uuid) -> Result<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT seat_id FROM tickets WHERE showtime_id = $1 AND status = 'confirmed'",
    )
    .bind(showtime_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn list_for_transaction(pool: &PgPool, transaction_id: Uuid) -> Result<Vec<Ticket>> {
    let query = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE transaction_id = $1");
    let tickets = sqlx::query_as::<_, Ticket>(&query)
        .bind(transaction_id)
        .fetch_all(pool)
        .await?;

    Ok(tickets)
}
