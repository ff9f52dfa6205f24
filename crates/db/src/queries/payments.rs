use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction as SqlxTx};
use uuid::Uuid;

use crate::models::Payment;
use cinerail_types::{AppError, Result};

pub struct NewPayment {
    pub order_id: String,
    pub session_id: String,
    pub user_id: Option<Uuid>,
    pub method: String,
    pub amount: Decimal,
    pub description: String,
    pub client_ip: Option<String>,
    pub contact_email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

const PAYMENT_COLUMNS: &str = r#"
    id, order_id, session_id, user_id, method, amount, status,
    description, client_ip, contact_email, gateway_url, gateway_txn_ref,
    gateway_transaction_no, gateway_response_code,
    gateway_bank_code, gateway_card_type, gateway_pay_date,
    expires_at, created_at, settled_at
"#;

/// Inserts the pending payment row. Runs inside the caller's
/// transaction so a failure to bind holds afterwards rolls the insert
/// back too.
pub async fn create(tx: &mut SqlxTx<'_, Postgres>, req: NewPayment) -> Result<Payment> {
    let query = format!(
        r#"
        INSERT INTO payments (
            id, order_id, session_id, user_id, method, amount, status,
            description, client_ip, contact_email, expires_at, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8, $9, $10, NOW())
        RETURNING {PAYMENT_COLUMNS}
        "#
    );

    let payment = sqlx::query_as::<_, Payment>(&query)
        .bind(Uuid::new_v4())
        .bind(&req.order_id)
        .bind(&req.session_id)
        .bind(req.user_id)
        .bind(&req.method)
        .bind(req.amount)
        .bind(&req.description)
        .bind(&req.client_ip)
        .bind(&req.contact_email)
        .bind(req.expires_at)
        .fetch_one(&mut **tx)
        .await?;

    Ok(payment)
}

/// Attaches the gateway-constructed payment URL after `Create` has
/// already committed (the URL embeds the generated `order_id`, which
/// only exists once the row is inserted).
pub async fn set_gateway_url(pool: &PgPool, payment_id: Uuid, url: &str) -> Result<()> {
    sqlx::query("UPDATE payments SET gateway_url = $2 WHERE id = $1")
        .bind(payment_id)
        .bind(url)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_by_order_id(pool: &PgPool, order_id: &str) -> Result<Payment> {
    let query = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1");
    sqlx::query_as::<_, Payment>(&query)
        .bind(order_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("payment {order_id}")))
}

/// Locks the payment row for the duration of `Settle`'s critical
/// section. Combined with the per-order-id mutex in the payment
/// orchestrator, this keeps a duplicate IPN/return-URL callback from
/// observing a half-settled row.
pub async fn fetch_for_update(tx: &mut SqlxTx<'_, Postgres>, order_id: &str) -> Result<Payment> {
    let query = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1 FOR UPDATE");
    sqlx::query_as::<_, Payment>(&query)
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("payment {order_id}")))
}

#[derive(Default)]
pub struct GatewayFields<'a> {
    pub txn_ref: Option<&'a str>,
    pub transaction_no: Option<&'a str>,
    pub response_code: Option<&'a str>,
    pub bank_code: Option<&'a str>,
    pub card_type: Option<&'a str>,
    pub pay_date: Option<&'a str>,
}

/// Transitions a still-pending payment to a terminal status (invariant
/// I5). The caller must have already confirmed via `fetch_for_update`
/// that the row is pending; this is the write half of the idempotency
/// gate, not the check itself.
pub async fn mark_terminal(
    tx: &mut SqlxTx<'_, Postgres>,
    payment_id: Uuid,
    status: &str,
    gw: GatewayFields<'_>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE payments
        SET status = $2,
            gateway_txn_ref = COALESCE($3, gateway_txn_ref),
            gateway_transaction_no = COALESCE($4, gateway_transaction_no),
            gateway_response_code = COALESCE($5, gateway_response_code),
            gateway_bank_code = COALESCE($6, gateway_bank_code),
            gateway_card_type = COALESCE($7, gateway_card_type),
            gateway_pay_date = COALESCE($8, gateway_pay_date),
            settled_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(payment_id)
    .bind(status)
    .bind(gw.txn_ref)
    .bind(gw.transaction_no)
    .bind(gw.response_code)
    .bind(gw.bank_code)
    .bind(gw.card_type)
    .bind(gw.pay_date)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
