use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Error taxonomy surfaced by the core, independent of transport.
///
/// Kept as a single non-generic enum rather than per-component error
/// types so route handlers have one mapping layer at the HTTP boundary:
/// exception-for-control-flow is replaced by typed returns throughout.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Seat already sold")]
    SeatSold,

    #[error("Seat currently held by another session")]
    SeatHeld,

    #[error("No pending reservations for this session")]
    NoReservations,

    #[error("Held seats expired before payment was settled")]
    Expired,

    #[error("Settlement busy, retry")]
    Busy,

    #[error("Invalid gateway signature")]
    GatewaySignature,

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payment error: {0}")]
    Payment(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl AppError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Database(_) | Self::Internal(_) => 500,
            Self::NotFound(_) => 404,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::BadRequest(_) | Self::Validation(_) | Self::NoReservations | Self::Expired => 400,
            Self::SeatSold | Self::SeatHeld => 409,
            Self::Busy => 503,
            Self::GatewaySignature => 400,
            Self::Payment(_) => 402,
            Self::ExternalService(_) => 502,
        }
    }
}
