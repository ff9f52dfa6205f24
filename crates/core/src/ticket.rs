use cinerail_bus::EventBus;
use cinerail_db::models::{Hold, Payment};
use cinerail_db::queries::{catalog, tickets, transactions};
use cinerail_db::Pool;
use cinerail_gateway::QrSigner;
use cinerail_types::api::{IssueResult, WsEvent};
use cinerail_types::enums::EventType;
use cinerail_types::{AppError, Result};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::{Postgres, Transaction as SqlxTx};
use uuid::Uuid;

use crate::pricing::seat_price;

const BOOKING_CODE_SUFFIX_LEN: usize = 4;
const BOOKING_CODE_MAX_ATTEMPTS: u32 = 10;

/// Generates a `BK` + `YYYYMMDD` + 4-char alphanumeric booking code,
/// adapted from a `generate_booking_code` helper (same
/// `rand`/`Alphanumeric` sampler, different prefix/format).
fn candidate_booking_code() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(BOOKING_CODE_SUFFIX_LEN)
        .map(char::from)
        .collect();

    format!("BK{}{}", chrono::Utc::now().format("%Y%m%d"), suffix.to_uppercase())
}

/// Ticket issuer: the atomic hold-to-ticket transition. Runs
/// entirely inside the caller's settle transaction; the caller commits
/// once this returns `Ok`. Best-effort side effects (email, bus
/// publish) are deliberately NOT done here — see `notify_and_broadcast`,
/// invoked by the orchestrator only after the transaction commits, so a
/// slow email or bus hiccup can never roll back a paid ticket.
pub struct TicketIssuer {
    bus: EventBus,
    qr: QrSigner,
}

impl TicketIssuer {
    pub fn new(bus: EventBus, qr: QrSigner) -> Self {
        Self { bus, qr }
    }

    /// Issues tickets for a settled payment, returning the resulting
    /// transaction id, booking code, and ticket ids. `holds` must
    /// already be the set of pending holds bound to `payment`, locked
    /// `FOR UPDATE` by the caller.
    pub async fn issue(
        &self,
        tx: &mut SqlxTx<'_, Postgres>,
        pool: &Pool,
        payment: &Payment,
        holds: &[Hold],
        transaction_id: Uuid,
        gateway_transaction_no: Option<&str>,
    ) -> Result<IssueResult> {
        let booking_code = self.generate_unique_booking_code(tx).await?;

        let showtime = catalog::find_showtime(pool, payment_showtime(holds)?).await?;

        let mut new_tickets = Vec::with_capacity(holds.len());
        let mut seat_labels = Vec::with_capacity(holds.len());
        for hold in holds {
            let seat = catalog::find_seat(pool, hold.seat_id).await?;
            let price = seat_price(showtime.base_price, &seat);
            let qr_token = self.qr.issue(
                Uuid::new_v4(),
                &booking_code,
                hold.user_id,
                &showtime.movie_title,
                &format!("{}{}", seat.row_label, seat.seat_number),
                hold.showtime_id,
                price,
            )?;
            seat_labels.push(format!("{}{}", seat.row_label, seat.seat_number));
            new_tickets.push(tickets::NewTicket {
                transaction_id,
                showtime_id: hold.showtime_id,
                seat_id: hold.seat_id,
                user_id: hold.user_id,
                price,
                booking_code: booking_code.clone(),
                qr_token,
            });
        }

        let created = tickets::create_many(tx, &new_tickets).await?;

        cinerail_db::queries::holds::confirm_by_payment(tx, payment.id, transaction_id).await?;

        transactions::mark_success(tx, transaction_id, &booking_code, gateway_transaction_no).await?;

        Ok(IssueResult {
            transaction_id,
            booking_code,
            ticket_ids: created.iter().map(|t| t.id).collect(),
        })
    }

    async fn generate_unique_booking_code(&self, tx: &mut SqlxTx<'_, Postgres>) -> Result<String> {
        for _ in 0..BOOKING_CODE_MAX_ATTEMPTS {
            let candidate = candidate_booking_code();
            if !transactions::code_exists(tx, &candidate).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal("could not generate a unique booking code".into()))
    }

    /// Publishes the post-commit `seat_update` events. Call only after
    /// the settle transaction has committed.
    pub fn broadcast_confirmed(&self, showtime_id: Uuid, seat_ids: &[Uuid]) {
        for seat_id in seat_ids {
            self.bus.publish(
                showtime_id,
                WsEvent::new(
                    EventType::SeatUpdate,
                    showtime_id,
                    serde_json::json!({ "seat_id": seat_id, "status": "confirmed" }),
                ),
            );
        }
    }
}

fn payment_showtime(holds: &[Hold]) -> Result<Uuid> {
    holds
        .first()
        .map(|h| h.showtime_id)
        .ok_or(AppError::NoReservations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_code_matches_expected_shape() {
        let code = candidate_booking_code();
        assert!(code.starts_with("BK"));
        assert_eq!(code.len(), 2 + 8 + BOOKING_CODE_SUFFIX_LEN);
        assert!(code[2..10].chars().all(|c| c.is_ascii_digit()));
        assert!(code[10..].chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
