pub mod catalog;
pub mod hold;
pub mod payment;
pub mod ticket;
pub mod transaction;

pub use catalog::{Seat, Showtime};
pub use hold::Hold;
pub use payment::Payment;
pub use ticket::Ticket;
pub use transaction::Transaction;
