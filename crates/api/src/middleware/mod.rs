pub mod auth;

pub use auth::OptionalAuthUser;

use std::sync::Arc;

use cinerail_bus::{EventBus, SessionRegistry};
use cinerail_core::{PaymentOrchestrator, ReservationService};
use cinerail_db::Pool;

/// Shared application state, constructed once at startup in `main` and
/// handed to every handler via axum's `State` extractor: explicit
/// construction and dependency passing, no globally instantiated
/// service objects.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub reservations: ReservationService,
    pub payments: Arc<PaymentOrchestrator>,
    pub registry: SessionRegistry,
    pub bus: EventBus,
    pub jwt_secret: String,
}
