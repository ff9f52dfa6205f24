//! `/payments` routes: checkout creation, the two gateway callback
//! entry points, and a read-only status lookup.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use cinerail_gateway::vnpay;
use cinerail_types::api::{IpnAck, PaymentRequest, PaymentResponse, PaymentStatusResponse};
use cinerail_types::AppError;
use validator::Validate;

use crate::middleware::{AppState, OptionalAuthUser};
use crate::response::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments/create", post(create))
        .route("/payments/vnpay/return", get(vnpay_return))
        .route("/payments/vnpay/ipn", get(vnpay_ipn))
        .route("/payments/payment-status/:order_id", get(status))
}

async fn create(
    State(state): State<AppState>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let response = state.payments.create(req, user_id, addr.ip().to_string()).await?;
    Ok(Json(response))
}

/// The browser-facing return URL. Always resolves to
/// a 200 with the settle outcome embedded in the body: a patron's
/// browser following this redirect has nowhere useful to go on a raw
/// HTTP error, so failures are reported in-band instead.
async fn vnpay_return(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<cinerail_types::api::SettleResult> {
    Json(settle_from_query(&state, params).await)
}

/// The gateway-to-server IPN endpoint. Always returns 200 by design:
/// the gateway only inspects the
/// `RspCode` field of the JSON body, never the HTTP status, and retries
/// on anything it doesn't recognize, so every branch below still
/// answers 200.
async fn vnpay_ipn(State(state): State<AppState>, Query(params): Query<HashMap<String, String>>) -> Json<IpnAck> {
    let callback = match vnpay::CallbackParams::from_query(&params) {
        Ok(callback) => callback,
        Err(e) => {
            tracing::warn!(error = %e, "vnpay ipn: malformed callback");
            return Json(IpnAck::unknown_order());
        }
    };

    match state.payments.handle_callback(callback).await {
        // Both a fresh settle and a re-delivered duplicate land here — the
        // gateway retries until it sees 00, and our settle is idempotent,
        // so there is no distinct "already confirmed" case to surface.
        Ok(settled) if settled.reason.as_deref() == Some("Invalid signature") => {
            Json(IpnAck::invalid_signature())
        }
        Ok(_) => Json(IpnAck::ok()),
        Err(AppError::NotFound(_)) => Json(IpnAck::unknown_order()),
        Err(e) => {
            tracing::error!(error = %e, "vnpay ipn: settle failed");
            Json(IpnAck::unknown_error())
        }
    }
}

async fn settle_from_query(
    state: &AppState,
    params: HashMap<String, String>,
) -> cinerail_types::api::SettleResult {
    use cinerail_types::enums::PaymentStatus;

    let callback = match vnpay::CallbackParams::from_query(&params) {
        Ok(callback) => callback,
        Err(e) => {
            return cinerail_types::api::SettleResult {
                status: PaymentStatus::Failed,
                booking_code: None,
                reason: Some(e),
            }
        }
    };

    match state.payments.handle_callback(callback).await {
        Ok(settled) => settled,
        Err(e) => cinerail_types::api::SettleResult {
            status: PaymentStatus::Failed,
            booking_code: None,
            reason: Some(e.to_string()),
        },
    }
}

async fn status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<PaymentStatusResponse>, ApiError> {
    let status = state.payments.status(&order_id).await?;
    Ok(Json(status))
}
