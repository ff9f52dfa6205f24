//! Payment Orchestrator: price computation, gateway URL creation, and
//! callback settlement. Shaped like a stubbed Stripe integration,
//! carrying VNPay's exact protocol semantics underneath.
//!
//! The per-order-id settle mutex is owned by this one struct, built once
//! at startup and passed around by `Arc` — explicit construction with
//! no `lazy_static`/`once_cell` global service objects.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use cinerail_bus::EventBus;
use cinerail_db::queries::{catalog, holds, payments, transactions};
use cinerail_db::queries::payments::{GatewayFields, NewPayment};
use cinerail_db::Pool;
use cinerail_gateway::{vnpay, BookingConfirmation, Notifier};
use cinerail_types::api::{PaymentRequest, PaymentResponse, PaymentStatusResponse, SettleResult};
use cinerail_types::enums::{PaymentMethod, PaymentStatus};
use cinerail_types::{AppError, Result};
use rust_decimal::Decimal;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::pricing::seat_price;
use crate::ticket::TicketIssuer;

/// Upper bound on acquiring the per-order-id settle lock; on timeout
/// the caller gets `Busy` rather than blocking indefinitely.
const SETTLE_LOCK_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// How long a created payment (and its gateway URL) remains valid before
/// the holds it covers could expire out from under it. Chosen to
/// comfortably exceed the 10-minute hold TTL so a slow checkout doesn't
/// routinely race it.
const PAYMENT_EXPIRY: StdDuration = StdDuration::from_secs(15 * 60);

/// Gateway-agnostic outcome of a callback, already validated and
/// decoded by the gateway-specific layer.
#[derive(Debug, Clone)]
pub struct GatewayResult {
    pub success: bool,
    pub transaction_no: String,
    pub response_code: String,
    pub bank_code: Option<String>,
    pub card_type: Option<String>,
    pub pay_date: Option<String>,
}

pub struct PaymentOrchestrator {
    pool: Pool,
    bus: EventBus,
    vnpay: vnpay::VnpayConfig,
    ticket_issuer: TicketIssuer,
    notifier: Option<Notifier>,
    settle_locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl PaymentOrchestrator {
    pub fn new(
        pool: Pool,
        bus: EventBus,
        vnpay: vnpay::VnpayConfig,
        ticket_issuer: TicketIssuer,
        notifier: Option<Notifier>,
    ) -> Self {
        Self {
            pool,
            bus,
            vnpay,
            ticket_issuer,
            notifier,
            settle_locks: StdMutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, order_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.settle_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(order_id.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    /// Opens a checkout: prices the session's live pending holds, opens
    /// a payment and pending transaction, binds the holds, and builds
    /// the gateway URL.
    pub async fn create(
        &self,
        req: PaymentRequest,
        user_id: Option<Uuid>,
        client_ip: String,
    ) -> Result<PaymentResponse> {
        let live_holds = holds::live_pending_for_session(&self.pool, &req.session_id).await?;
        if live_holds.is_empty() {
            return Err(AppError::NoReservations);
        }

        let mut total = Decimal::ZERO;
        for hold in &live_holds {
            let showtime = catalog::find_showtime(&self.pool, hold.showtime_id).await?;
            let seat = catalog::find_seat(&self.pool, hold.seat_id).await?;
            total += seat_price(showtime.base_price, &seat);
        }

        let order_id = Uuid::new_v4().to_string();
        let method = req.method.as_str().to_string();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let payment = payments::create(
            &mut tx,
            NewPayment {
                order_id: order_id.clone(),
                session_id: req.session_id.clone(),
                user_id,
                method: method.clone(),
                amount: total,
                description: req.description.clone(),
                client_ip: Some(client_ip.clone()),
                contact_email: req.contact_email.clone(),
                expires_at: now + Duration::from_std(PAYMENT_EXPIRY).unwrap_or(Duration::minutes(15)),
            },
        )
        .await?;

        transactions::create_pending(&mut tx, payment.id, user_id, total, &method).await?;

        let hold_ids: Vec<Uuid> = live_holds.iter().map(|h| h.id).collect();
        let bound = holds::bind_payment(&mut tx, &hold_ids, payment.id).await?;
        if bound == 0 {
            return Err(AppError::NoReservations);
        }

        tx.commit().await?;

        let gateway_url = if req.method == PaymentMethod::Vnpay {
            let url = vnpay::build_payment_url(
                &self.vnpay,
                &vnpay::CreateUrlRequest {
                    order_id: order_id.clone(),
                    amount_major: total,
                    order_desc: req.description.clone(),
                    locale: req.language.clone().unwrap_or_else(|| "vn".to_string()),
                    client_ip,
                    create_date: now,
                },
            );
            payments::set_gateway_url(&self.pool, payment.id, &url).await?;
            Some(url)
        } else {
            None
        };

        Ok(PaymentResponse {
            order_id,
            payment_url: gateway_url,
            amount: total,
            method: req.method,
            status: PaymentStatus::Pending,
        })
    }

    /// Handles a decoded gateway callback. Verifies the gateway
    /// signature before touching the database at all — an unsigned or
    /// mis-signed callback never mutates a payment.
    pub async fn handle_callback(&self, params: vnpay::CallbackParams) -> Result<SettleResult> {
        if !vnpay::verify_signature(&self.vnpay.hash_secret, &params) {
            return Ok(SettleResult {
                status: PaymentStatus::Failed,
                booking_code: None,
                reason: Some("Invalid signature".to_string()),
            });
        }

        let result = GatewayResult {
            success: vnpay::is_success(&params),
            transaction_no: params.transaction_no,
            response_code: params.response_code,
            bank_code: params.bank_code,
            card_type: params.card_type,
            pay_date: params.pay_date,
        };

        self.settle(&params.order_id, result).await
    }

    /// Settles a payment against a gateway result — the critical
    /// section. Serialized per order-id so a gateway IPN racing the user's
    /// browser return can't observe or create a half-settled row.
    pub async fn settle(&self, order_id: &str, result: GatewayResult) -> Result<SettleResult> {
        let lock = self.lock_for(order_id);
        let _guard = tokio::time::timeout(SETTLE_LOCK_TIMEOUT, lock.lock())
            .await
            .map_err(|_| AppError::Busy)?;

        self.settle_locked(order_id, result).await
    }

    async fn settle_locked(&self, order_id: &str, result: GatewayResult) -> Result<SettleResult> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::fetch_for_update(&mut tx, order_id).await?;
        let status = PaymentStatus::from_str(&payment.status).unwrap_or(PaymentStatus::Pending);

        // Idempotency gate: a terminal payment is never rewritten;
        // duplicate callbacks echo the prior result.
        if status.is_terminal() {
            let txn = transactions::find_by_payment_id(&mut tx, payment.id).await?;
            tx.rollback().await.ok();
            return Ok(match status {
                PaymentStatus::Success => SettleResult {
                    status: PaymentStatus::Success,
                    booking_code: txn.booking_code,
                    reason: None,
                },
                _ => SettleResult { status: PaymentStatus::Failed, booking_code: None, reason: None },
            });
        }

        let gw = GatewayFields {
            transaction_no: Some(&result.transaction_no),
            response_code: Some(&result.response_code),
            bank_code: result.bank_code.as_deref(),
            card_type: result.card_type.as_deref(),
            pay_date: result.pay_date.as_deref(),
            ..Default::default()
        };

        if !result.success {
            let txn = transactions::find_by_payment_id(&mut tx, payment.id).await?;
            payments::mark_terminal(&mut tx, payment.id, "failed", gw).await?;
            transactions::mark_failed(&mut tx, txn.id).await?;
            tx.commit().await?;
            return Ok(SettleResult {
                status: PaymentStatus::Failed,
                booking_code: None,
                reason: Some("gateway reported failure".to_string()),
            });
        }

        let pending_holds = holds::pending_for_payment(&mut tx, payment.id).await?;

        if pending_holds.is_empty() {
            let txn = transactions::find_by_payment_id(&mut tx, payment.id).await?;
            payments::mark_terminal(&mut tx, payment.id, "failed", gw).await?;
            transactions::mark_failed(&mut tx, txn.id).await?;
            tx.commit().await?;
            return Ok(SettleResult {
                status: PaymentStatus::Failed,
                booking_code: None,
                reason: Some("no reservations".to_string()),
            });
        }

        if pending_holds.iter().any(|h| h.expires_at <= Utc::now()) {
            let txn = transactions::find_by_payment_id(&mut tx, payment.id).await?;
            payments::mark_terminal(&mut tx, payment.id, "failed", gw).await?;
            transactions::mark_failed(&mut tx, txn.id).await?;
            tx.commit().await?;
            return Ok(SettleResult {
                status: PaymentStatus::Failed,
                booking_code: None,
                reason: Some("reservation expired".to_string()),
            });
        }

        let txn = transactions::find_by_payment_id(&mut tx, payment.id).await?;
        let issue = self
            .ticket_issuer
            .issue(&mut tx, &self.pool, &payment, &pending_holds, txn.id, Some(&result.transaction_no))
            .await?;

        payments::mark_terminal(&mut tx, payment.id, "success", gw).await?;
        tx.commit().await?;

        let showtime_id = pending_holds[0].showtime_id;
        let seat_ids: Vec<Uuid> = pending_holds.iter().map(|h| h.seat_id).collect();
        self.ticket_issuer.broadcast_confirmed(showtime_id, &seat_ids);

        self.notify_best_effort(showtime_id, &payment.order_id, &issue.booking_code, &seat_ids, payment.amount).await;

        Ok(SettleResult {
            status: PaymentStatus::Success,
            booking_code: Some(issue.booking_code),
            reason: None,
        })
    }

    /// Fire-and-forget confirmation email. Runs after the settle
    /// transaction has committed; any failure here is logged and never
    /// rolls back or re-opens the already-terminal payment. A session
    /// that never supplied `contact_email` (user accounts are an
    /// external collaborator here, guest checkout is the norm) is
    /// silently skipped rather than erroring, same as the notifier's
    /// isolated job pattern.
    async fn notify_best_effort(
        &self,
        showtime_id: Uuid,
        order_id: &str,
        booking_code: &str,
        seat_ids: &[Uuid],
        amount: Decimal,
    ) {
        let Some(notifier) = &self.notifier else { return };
        let Ok(payment) = payments::find_by_order_id(&self.pool, order_id).await else { return };
        let Some(to_address) = payment.contact_email.as_deref() else { return };

        let Ok(showtime) = catalog::find_showtime(&self.pool, showtime_id).await else { return };
        let mut seat_labels = Vec::with_capacity(seat_ids.len());
        for seat_id in seat_ids {
            match catalog::find_seat(&self.pool, *seat_id).await {
                Ok(seat) => seat_labels.push(format!("{}{}", seat.row_label, seat.seat_number)),
                Err(e) => tracing::warn!(error = %e, "notifier: could not resolve seat label, skipping it"),
            }
        }

        send_confirmation(
            notifier,
            to_address,
            booking_code,
            &showtime.movie_title,
            &showtime.starts_at.to_rfc3339(),
            &seat_labels,
            amount,
        )
        .await;
    }

    /// `GET /payments/payment-status/{order_id}` read-only lookup.
    pub async fn status(&self, order_id: &str) -> Result<PaymentStatusResponse> {
        let payment = payments::find_by_order_id(&self.pool, order_id).await?;
        let mut tx = self.pool.begin().await?;
        let booking_code = transactions::find_by_payment_id(&mut tx, payment.id)
            .await
            .ok()
            .and_then(|t| t.booking_code);
        tx.rollback().await.ok();
        Ok(payment.into_status_response(booking_code))
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

/// Sends the booking confirmation once the caller has a contact address
/// in hand (e.g. the route handler read `contact_email` off the
/// original `PaymentRequest` and still has it after `create`). Kept
/// separate from `settle_locked` so the settle critical section never
/// depends on an address the DB schema doesn't persist.
pub async fn send_confirmation(
    notifier: &Notifier,
    to_address: &str,
    booking_code: &str,
    movie_title: &str,
    showtime_label: &str,
    seat_labels: &[String],
    total_amount: Decimal,
) {
    notifier
        .send_booking_confirmation(BookingConfirmation {
            to_address,
            booking_code,
            movie_title,
            showtime_label,
            seat_labels,
            total_amount,
        })
        .await;
}
