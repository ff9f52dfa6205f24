use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction as SqlxTx};
use uuid::Uuid;

use crate::models::Transaction;
use cinerail_types::Result;

const TXN_COLUMNS: &str =
    "id, payment_id, user_id, total_amount, method, booking_code, external_reference, status, created_at";

/// Created pending alongside the payment, before a booking code
/// exists. Finalised by `mark_success` once the ticket issuer has
/// generated one.
pub async fn create_pending(
    tx: &mut SqlxTx<'_, Postgres>,
    payment_id: Uuid,
    user_id: Option<Uuid>,
    total_amount: Decimal,
    method: &str,
) -> Result<Transaction> {
    let query = format!(
        r#"
        INSERT INTO transactions (id, payment_id, user_id, total_amount, method, status, created_at)
        VALUES ($1, $2, $3, $4, $5, 'pending', NOW())
        RETURNING {TXN_COLUMNS}
        "#
    );

    let txn = sqlx::query_as::<_, Transaction>(&query)
        .bind(Uuid::new_v4())
        .bind(payment_id)
        .bind(user_id)
        .bind(total_amount)
        .bind(method)
        .fetch_one(&mut **tx)
        .await?;

    Ok(txn)
}

/// Settle success path: attaches the booking code and the gateway's
/// own transaction reference, marks the transaction successful.
pub async fn mark_success(
    tx: &mut SqlxTx<'_, Postgres>,
    transaction_id: Uuid,
    booking_code: &str,
    external_reference: Option<&str>,
) -> Result<Transaction> {
    let query = format!(
        r#"
        UPDATE transactions
        SET status = 'success', booking_code = $2, external_reference = $3
        WHERE id = $1
        RETURNING {TXN_COLUMNS}
        "#
    );

    let txn = sqlx::query_as::<_, Transaction>(&query)
        .bind(transaction_id)
        .bind(booking_code)
        .bind(external_reference)
        .fetch_one(&mut **tx)
        .await?;

    Ok(txn)
}

/// Looks up the transaction paired 1:1 with a payment. Used by
/// `Settle` to locate the row to finalize or fail, and by the
/// idempotency gate to recover a prior run's booking code.
pub async fn find_by_payment_id(tx: &mut SqlxTx<'_, Postgres>, payment_id: Uuid) -> Result<Transaction> {
    let query = format!("SELECT {TXN_COLUMNS} FROM transactions WHERE payment_id = $1 FOR UPDATE");
    sqlx::query_as::<_, Transaction>(&query)
        .bind(payment_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| cinerail_types::AppError::Internal(format!("payment {payment_id} has no paired transaction")))
}

pub async fn mark_failed(tx: &mut SqlxTx<'_, Postgres>, transaction_id: Uuid) -> Result<()> {
    sqlx::query("UPDATE transactions SET status = 'failed' WHERE id = $1")
        .bind(transaction_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Collision check for booking-code generation.
pub async fn code_exists(tx: &mut SqlxTx<'_, Postgres>, booking_code: &str) -> Result<bool> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT 1 FROM transactions WHERE booking_code = $1")
            .bind(booking_code)
            .fetch_optional(&mut **tx)
            .await?;

    Ok(row.is_some())
}
