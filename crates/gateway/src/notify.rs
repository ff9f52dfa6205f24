//! Best-effort booking confirmation email. Failures here are logged
//! and swallowed: a slow or down SMTP relay must never roll back a
//! settled payment or block ticket issuance — notification is
//! fire-and-forget, off the critical path.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Clone)]
pub struct Notifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

pub struct BookingConfirmation<'a> {
    pub to_address: &'a str,
    pub booking_code: &'a str,
    pub movie_title: &'a str,
    pub showtime_label: &'a str,
    pub seat_labels: &'a [String],
    pub total_amount: Decimal,
}

impl Notifier {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .credentials(creds)
            .build();
        Ok(Self { transport, from_address: config.from_address.clone() })
    }

    /// Sends the confirmation. Never returns an error to the caller;
    /// logs on failure and moves on, keeping this fire-and-forget.
    pub async fn send_booking_confirmation(&self, confirmation: BookingConfirmation<'_>) {
        let body = format!(
            "Your booking is confirmed.\n\nBooking code: {}\nMovie: {}\nShowtime: {}\nSeats: {}\nTotal: {}\n",
            confirmation.booking_code,
            confirmation.movie_title,
            confirmation.showtime_label,
            confirmation.seat_labels.join(", "),
            confirmation.total_amount,
        );

        let message = Message::builder()
            .from(match self.from_address.parse() {
                Ok(addr) => addr,
                Err(e) => {
                    tracing::warn!(error = %e, "notifier: invalid from_address, skipping send");
                    return;
                }
            })
            .to(match confirmation.to_address.parse() {
                Ok(addr) => addr,
                Err(e) => {
                    tracing::warn!(error = %e, booking_code = confirmation.booking_code, "notifier: invalid recipient, skipping send");
                    return;
                }
            })
            .subject(format!("Booking confirmed: {}", confirmation.booking_code))
            .header(ContentType::TEXT_PLAIN)
            .body(body);

        let message = match message {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "notifier: failed to build message");
                return;
            }
        };

        if let Err(e) = self.transport.send(message).await {
            tracing::warn!(error = %e, booking_code = confirmation.booking_code, "notifier: send failed");
        }
    }
}
