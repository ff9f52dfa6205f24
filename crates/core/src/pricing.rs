use cinerail_db::models::Seat;
use rust_decimal::Decimal;

use cinerail_types::enums::SeatType;

/// The one pricing formula used by both the payment orchestrator and
/// the ticket issuer, which must recompute the identical figure rather
/// than trust a stored value. See `SeatType::price_multiplier` and
/// DESIGN.md's Open Questions entry on the pricing-formula ambiguity.
pub fn seat_price(base_price: Decimal, seat: &Seat) -> Decimal {
    let seat_type: SeatType = seat.seat_type.parse().unwrap_or_default();
    base_price * seat_type.price_multiplier()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn seat(seat_type: &str) -> Seat {
        Seat {
            id: Uuid::new_v4(),
            showtime_id: Uuid::new_v4(),
            row_label: "A".into(),
            seat_number: 1,
            seat_type: seat_type.to_string(),
        }
    }

    #[test]
    fn regular_seat_charges_base_price() {
        let base = Decimal::new(1000_00, 2);
        assert_eq!(seat_price(base, &seat("regular")), base);
    }

    #[test]
    fn vip_and_couple_apply_their_multipliers() {
        let base = Decimal::new(1000_00, 2);
        assert_eq!(seat_price(base, &seat("vip")), base * Decimal::new(15, 1));
        assert_eq!(seat_price(base, &seat("couple")), base * Decimal::new(20, 1));
    }

    #[test]
    fn unknown_seat_type_falls_back_to_regular() {
        let base = Decimal::new(1000_00, 2);
        assert_eq!(seat_price(base, &seat("mystery")), base);
    }
}
