//! Ticket QR payload signing. The QR code a patron
//! scans at the door encodes a JWT rather than a bare ticket id, so the
//! door scanner can validate authenticity offline against a shared
//! secret without a database round trip.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cinerail_types::{AppError, Result};

const TICKET_TOKEN_TTL_HOURS: i64 = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketClaims {
    pub ticket_id: Uuid,
    pub booking_code: String,
    pub user_id: Option<Uuid>,
    pub movie_title: String,
    pub seat_label: String,
    pub showtime_id: Uuid,
    pub price: Decimal,
    pub exp: i64,
    pub iat: i64,
}

pub struct QrSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl QrSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Produces the signed token embedded in the ticket's QR payload.
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        &self,
        ticket_id: Uuid,
        booking_code: &str,
        user_id: Option<Uuid>,
        movie_title: &str,
        seat_label: &str,
        showtime_id: Uuid,
        price: Decimal,
    ) -> Result<String> {
        let now = Utc::now();
        let claims = TicketClaims {
            ticket_id,
            booking_code: booking_code.to_string(),
            user_id,
            movie_title: movie_title.to_string(),
            seat_label: seat_label.to_string(),
            showtime_id,
            price,
            iat: now.timestamp(),
            exp: (now + Duration::hours(TICKET_TOKEN_TTL_HOURS)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("qr token signing failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<TicketClaims> {
        let data = decode::<TicketClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| AppError::BadRequest(format!("invalid ticket token: {e}")))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issues_and_verifies_a_token() {
        let signer = QrSigner::new("a-test-secret");
        let ticket_id = Uuid::new_v4();
        let showtime_id = Uuid::new_v4();

        let token = signer
            .issue(ticket_id, "BK202607280001", None, "Dune: Part Three", "A1", showtime_id, Decimal::new(1200000, 2))
            .expect("signing should succeed");

        let claims = signer.verify(&token).expect("verification should succeed");
        assert_eq!(claims.ticket_id, ticket_id);
        assert_eq!(claims.booking_code, "BK202607280001");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_a_token_signed_with_a_different_secret() {
        let signer_a = QrSigner::new("secret-a");
        let signer_b = QrSigner::new("secret-b");

        let token = signer_a
            .issue(Uuid::new_v4(), "BK1", None, "Movie", "A1", Uuid::new_v4(), Decimal::ONE)
            .unwrap();

        assert!(signer_b.verify(&token).is_err());
    }
}
