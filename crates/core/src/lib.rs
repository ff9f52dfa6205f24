pub mod config;
pub mod payment;
pub mod pricing;
pub mod reaper;
pub mod reservation;
pub mod ticket;

pub use config::Config;
pub use payment::PaymentOrchestrator;
pub use reservation::{ReservationService, ReserveItem};
pub use ticket::TicketIssuer;
