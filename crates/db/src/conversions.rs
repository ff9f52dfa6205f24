//! Conversions from DB row shapes to API response types, kept in one
//! place so route handlers never hand-assemble response structs.

use std::str::FromStr;

use crate::models::{Hold, Payment};
use cinerail_types::{
    api::{HoldResponse, PaymentStatusResponse},
    enums::{HoldStatus, PaymentMethod, PaymentStatus},
};

impl From<Hold> for HoldResponse {
    fn from(h: Hold) -> Self {
        Self {
            id: h.id,
            showtime_id: h.showtime_id,
            seat_id: h.seat_id,
            session_id: h.session_id,
            user_id: h.user_id,
            status: HoldStatus::from_str(&h.status).unwrap_or(HoldStatus::Pending),
            reserved_at: h.reserved_at,
            expires_at: h.expires_at,
            payment_id: h.payment_id,
            transaction_id: h.transaction_id,
        }
    }
}

impl From<&Hold> for HoldResponse {
    fn from(h: &Hold) -> Self {
        Self {
            id: h.id,
            showtime_id: h.showtime_id,
            seat_id: h.seat_id,
            session_id: h.session_id.clone(),
            user_id: h.user_id,
            status: HoldStatus::from_str(&h.status).unwrap_or(HoldStatus::Pending),
            reserved_at: h.reserved_at,
            expires_at: h.expires_at,
            payment_id: h.payment_id,
            transaction_id: h.transaction_id,
        }
    }
}

impl Payment {
    pub fn into_status_response(self, booking_code: Option<String>) -> PaymentStatusResponse {
        PaymentStatusResponse {
            order_id: self.order_id,
            status: PaymentStatus::from_str(&self.status).unwrap_or(PaymentStatus::Pending),
            amount: self.amount,
            method: PaymentMethod::from_str(&self.method).unwrap_or(PaymentMethod::Vnpay),
            booking_code,
            created_at: self.created_at,
        }
    }
}
