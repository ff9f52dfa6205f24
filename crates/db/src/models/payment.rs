use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Row shape of the `payments` table. One row per gateway attempt, keyed
/// by `order_id` (the value handed to VNPay as `vnp_TxnRef`).
///
/// Modeled as a single product type with every gateway-specific field
/// flattened in as `Option<_>`, rather than an inheritance-style
/// `Payment`/`VNPayPayment` split: a tagged union over ORM inheritance.
#[derive(Debug, Clone, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: String,
    pub session_id: String,
    pub user_id: Option<Uuid>,
    pub method: String,
    pub amount: Decimal,
    pub status: String,
    pub description: String,
    pub client_ip: Option<String>,
    pub contact_email: Option<String>,
    pub gateway_url: Option<String>,
    pub gateway_txn_ref: Option<String>,
    pub gateway_transaction_no: Option<String>,
    pub gateway_response_code: Option<String>,
    pub gateway_bank_code: Option<String>,
    pub gateway_card_type: Option<String>,
    pub gateway_pay_date: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}
