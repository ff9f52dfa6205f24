use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::enums::{PaymentMethod, PaymentStatus};

/// `POST /payments/create` request body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PaymentRequest {
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    pub method: PaymentMethod,
    #[validate(length(max = 255))]
    pub description: String,
    /// VNPay locale, e.g. "vn" / "en". Defaults to "vn" when absent.
    pub language: Option<String>,
    /// Best-effort delivery address for the post-settlement booking
    /// confirmation. User accounts are an external collaborator here,
    /// so guest/session checkouts have no address to look up unless
    /// the client supplies one here.
    #[validate(email)]
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export, export_to = "../../../frontend/src/lib/types/")]
pub struct PaymentResponse {
    pub order_id: String,
    pub payment_url: Option<String>,
    pub amount: rust_decimal::Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

/// Outcome of `Settle`, returned to both the return-URL and IPN callers.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export, export_to = "../../../frontend/src/lib/types/")]
pub struct SettleResult {
    pub status: PaymentStatus,
    pub booking_code: Option<String>,
    pub reason: Option<String>,
}

/// `GET /payments/payment-status/{order_id}` response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export, export_to = "../../../frontend/src/lib/types/")]
pub struct PaymentStatusResponse {
    pub order_id: String,
    pub status: PaymentStatus,
    pub amount: rust_decimal::Decimal,
    pub method: PaymentMethod,
    pub booking_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// IPN response body, shaped to the gateway's RspCode/Message protocol.
/// The endpoint always answers HTTP 200; the outcome lives in this body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IpnAck {
    #[serde(rename = "RspCode")]
    pub rsp_code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

impl IpnAck {
    pub fn ok() -> Self {
        Self { rsp_code: "00".into(), message: "Confirm Success".into() }
    }

    pub fn unknown_order() -> Self {
        Self { rsp_code: "01".into(), message: "Order not found".into() }
    }

    pub fn invalid_signature() -> Self {
        Self { rsp_code: "97".into(), message: "Invalid signature".into() }
    }

    pub fn already_confirmed() -> Self {
        Self { rsp_code: "02".into(), message: "Order already confirmed".into() }
    }

    pub fn unknown_error() -> Self {
        Self { rsp_code: "99".into(), message: "Unknown error".into() }
    }
}

/// Result produced by ticket issuance, carried back through Settle.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export, export_to = "../../../frontend/src/lib/types/")]
pub struct IssueResult {
    pub transaction_id: Uuid,
    pub booking_code: String,
    pub ticket_ids: Vec<Uuid>,
}
