pub mod notify;
pub mod qr;
pub mod vnpay;

pub use notify::{BookingConfirmation, Notifier, SmtpConfig};
pub use qr::{QrSigner, TicketClaims};
pub use vnpay::{CallbackParams, CreateUrlRequest, VnpayConfig};
