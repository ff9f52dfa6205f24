use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Groups the holds settled together under one `booking_code` (spec P7).
/// Created pending alongside its `Payment` and finalised by the ticket
/// issuer once tickets exist.
#[derive(Debug, Clone, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub user_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub method: String,
    pub booking_code: Option<String>,
    pub external_reference: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
