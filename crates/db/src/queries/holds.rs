use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Hold;
use cinerail_types::{AppError, Result};

pub struct NewHold {
    pub showtime_id: Uuid,
    pub seat_id: Uuid,
    pub session_id: String,
    pub user_id: Option<Uuid>,
}

/// All holds that currently occupy a seat (pending-and-unexpired or
/// confirmed), used to build the `InitialData` snapshot on connect.
pub async fn list_live_for_showtime(pool: &PgPool, showtime_id: Uuid) -> Result<Vec<Hold>> {
    let holds = sqlx::query_as::<_, Hold>(
        r#"
        SELECT id, showtime_id, seat_id, session_id, user_id, status,
               reserved_at, expires_at, payment_id, transaction_id
        FROM holds
        WHERE showtime_id = $1
          AND (status = 'confirmed' OR (status = 'pending' AND expires_at > NOW()))
        "#,
    )
    .bind(showtime_id)
    .fetch_all(pool)
    .await?;

    Ok(holds)
}

/// Serializes concurrent attempts on the same seat via a transaction-scoped
/// advisory lock, keyed on `(showtime_id, seat_id)`. The partial unique
/// index `holds_live_unique_idx` (see migrations) is the actual source of
/// truth for one-live-hold-per-seat; the advisory lock only avoids
/// surfacing spurious unique-violation errors to well-behaved,
/// non-racing callers.
async fn lock_seat(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, showtime_id: Uuid, seat_id: Uuid) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(format!("{showtime_id}:{seat_id}"))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// The partial unique index backing one-live-hold-per-seat can't
/// reference `NOW()` (index predicates must be immutable), so a
/// pending hold whose TTL has
/// lapsed but hasn't been swept by the reaper yet still occupies the
/// index. Expire it in place before checking liveness so a fresh
/// reservation on the same seat doesn't spuriously collide with it.
async fn expire_in_place(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    showtime_id: Uuid,
    seat_id: Uuid,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE holds
        SET status = 'cancelled'
        WHERE showtime_id = $1 AND seat_id = $2
          AND status = 'pending' AND expires_at <= NOW()
        "#,
    )
    .bind(showtime_id)
    .bind(seat_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn live_hold_for_seat(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    showtime_id: Uuid,
    seat_id: Uuid,
) -> Result<Option<Hold>> {
    let existing = sqlx::query_as::<_, Hold>(
        r#"
        SELECT id, showtime_id, seat_id, session_id, user_id, status,
               reserved_at, expires_at, payment_id, transaction_id
        FROM holds
        WHERE showtime_id = $1 AND seat_id = $2
          AND (status = 'confirmed' OR (status = 'pending' AND expires_at > NOW()))
        "#,
    )
    .bind(showtime_id)
    .bind(seat_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(existing)
}

async fn insert_hold(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    req: &NewHold,
    ttl: Duration,
) -> Result<Hold> {
    let now = Utc::now();
    let expires_at = now + ttl;

    let hold = sqlx::query_as::<_, Hold>(
        r#"
        INSERT INTO holds (id, showtime_id, seat_id, session_id, user_id, status, reserved_at, expires_at)
        VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7)
        RETURNING id, showtime_id, seat_id, session_id, user_id, status,
                  reserved_at, expires_at, payment_id, transaction_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.showtime_id)
    .bind(req.seat_id)
    .bind(&req.session_id)
    .bind(req.user_id)
    .bind(now)
    .bind(expires_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.constraint() == Some("holds_live_unique_idx") => {
            AppError::SeatHeld
        }
        _ => AppError::from(e),
    })?;

    Ok(hold)
}

/// Reserve a single seat. Returns `SeatSold` if a confirmed hold already
/// owns the seat, `SeatHeld` if another session's pending hold is still
/// live.
pub async fn try_create(pool: &PgPool, req: NewHold, ttl: Duration) -> Result<Hold> {
    let mut tx = pool.begin().await?;
    lock_seat(&mut tx, req.showtime_id, req.seat_id).await?;
    expire_in_place(&mut tx, req.showtime_id, req.seat_id).await?;

    if let Some(existing) = live_hold_for_seat(&mut tx, req.showtime_id, req.seat_id).await? {
        return Err(if existing.status == "confirmed" {
            AppError::SeatSold
        } else {
            AppError::SeatHeld
        });
    }

    let hold = insert_hold(&mut tx, &req, ttl).await?;
    tx.commit().await?;
    Ok(hold)
}

/// Reserve every seat in `items` or none at all (spec P6: bulk atomicity).
/// Seats are locked in a stable order (sorted by id) to avoid deadlocking
/// against another bulk call racing on an overlapping seat set.
pub async fn try_create_bulk(pool: &PgPool, mut items: Vec<NewHold>, ttl: Duration) -> Result<Vec<Hold>> {
    items.sort_by_key(|i| i.seat_id);

    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(items.len());

    for req in &items {
        lock_seat(&mut tx, req.showtime_id, req.seat_id).await?;
        expire_in_place(&mut tx, req.showtime_id, req.seat_id).await?;
        if let Some(existing) = live_hold_for_seat(&mut tx, req.showtime_id, req.seat_id).await? {
            return Err(if existing.status == "confirmed" {
                AppError::SeatSold
            } else {
                AppError::SeatHeld
            });
        }
    }

    for req in &items {
        created.push(insert_hold(&mut tx, req, ttl).await?);
    }

    tx.commit().await?;
    Ok(created)
}

/// Live (confirmed or unexpired-pending) holds on the given seats,
/// regardless of owner. Used by `Cancel` to tell "seat already free" —
/// a no-op — apart from "seat is held or sold by someone else" — a 403.
pub async fn live_for_seats(pool: &PgPool, showtime_id: Uuid, seat_ids: &[Uuid]) -> Result<Vec<Hold>> {
    let holds = sqlx::query_as::<_, Hold>(
        r#"
        SELECT id, showtime_id, seat_id, session_id, user_id, status,
               reserved_at, expires_at, payment_id, transaction_id
        FROM holds
        WHERE showtime_id = $1
          AND seat_id = ANY($2)
          AND (status = 'confirmed' OR (status = 'pending' AND expires_at > NOW()))
        "#,
    )
    .bind(showtime_id)
    .bind(seat_ids)
    .fetch_all(pool)
    .await?;

    Ok(holds)
}

/// Releases every pending hold the caller's session owns on the named
/// seats, returning the seat ids actually released. Holds owned by a
/// different session, already confirmed, or already gone are skipped
/// silently rather than erroring: cancellation is idempotent.
pub async fn cancel_by_owner(
    pool: &PgPool,
    showtime_id: Uuid,
    seat_ids: &[Uuid],
    session_id: &str,
) -> Result<Vec<Uuid>> {
    let released: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        UPDATE holds
        SET status = 'cancelled'
        WHERE showtime_id = $1
          AND seat_id = ANY($2)
          AND session_id = $3
          AND status = 'pending'
        RETURNING seat_id
        "#,
    )
    .bind(showtime_id)
    .bind(seat_ids)
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(released.into_iter().map(|(id,)| id).collect())
}

/// Every live pending hold a session owns, across every showtime it has
/// browsed. Read outside any write transaction; the
/// authoritative re-check against drift happens in `bind_payment`,
/// which runs `FOR UPDATE` inside the caller's transaction.
pub async fn live_pending_for_session(pool: &PgPool, session_id: &str) -> Result<Vec<Hold>> {
    let holds = sqlx::query_as::<_, Hold>(
        r#"
        SELECT id, showtime_id, seat_id, session_id, user_id, status,
               reserved_at, expires_at, payment_id, transaction_id
        FROM holds
        WHERE session_id = $1 AND status = 'pending' AND expires_at > NOW()
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(holds)
}

/// Binds a payment to exactly the named holds, generalized to take the
/// hold ids the caller already gathered via `live_pending_for_session`
/// rather than re-deriving them, since a session's holds can span
/// showtimes. Runs inside the caller's transaction so a failing bind
/// rolls back the payment insert that precedes it. Returns the number
/// of holds actually bound.
pub async fn bind_payment(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    hold_ids: &[Uuid],
    payment_id: Uuid,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE holds SET payment_id = $1 WHERE id = ANY($2) AND status = 'pending'",
    )
    .bind(payment_id)
    .bind(hold_ids)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

/// Loads every hold bound to `payment_id` with status=pending (spec
/// §4.6 Settle step 4a), locked for the duration of the settle
/// transaction.
pub async fn pending_for_payment(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    payment_id: Uuid,
) -> Result<Vec<Hold>> {
    let holds = sqlx::query_as::<_, Hold>(
        r#"
        SELECT id, showtime_id, seat_id, session_id, user_id, status,
               reserved_at, expires_at, payment_id, transaction_id
        FROM holds
        WHERE payment_id = $1 AND status = 'pending'
        FOR UPDATE
        "#,
    )
    .bind(payment_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(holds)
}

/// Settle success path: every hold bound to `payment_id` becomes confirmed
/// and is tagged with the settlement's `transaction_id`.
pub async fn confirm_by_payment(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    payment_id: Uuid,
    transaction_id: Uuid,
) -> Result<Vec<Hold>> {
    let holds = sqlx::query_as::<_, Hold>(
        r#"
        UPDATE holds
        SET status = 'confirmed', transaction_id = $2
        WHERE payment_id = $1 AND status = 'pending'
        RETURNING id, showtime_id, seat_id, session_id, user_id, status,
                  reserved_at, expires_at, payment_id, transaction_id
        "#,
    )
    .bind(payment_id)
    .bind(transaction_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(holds)
}

/// Settle failure path: releases the seats back to the pool immediately
/// rather than waiting for TTL expiry.
pub async fn release_by_payment(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    payment_id: Uuid,
) -> Result<Vec<Hold>> {
    let holds = sqlx::query_as::<_, Hold>(
        r#"
        UPDATE holds
        SET status = 'cancelled'
        WHERE payment_id = $1 AND status = 'pending'
        RETURNING id, showtime_id, seat_id, session_id, user_id, status,
                  reserved_at, expires_at, payment_id, transaction_id
        "#,
    )
    .bind(payment_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(holds)
}

/// Reaper sweep: expires every pending hold whose TTL has lapsed and
/// was never bound to a payment, returning the released rows so the
/// caller can fan out `seat_released` events.
pub async fn sweep_expired(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<Hold>> {
    let expired = sqlx::query_as::<_, Hold>(
        r#"
        UPDATE holds
        SET status = 'cancelled'
        WHERE status = 'pending'
          AND expires_at <= $1
          AND payment_id IS NULL
        RETURNING id, showtime_id, seat_id, session_id, user_id, status,
                  reserved_at, expires_at, payment_id, transaction_id
        "#,
    )
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(expired)
}
