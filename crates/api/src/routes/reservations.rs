//! `/reservations` routes, thin HTTP adapters over
//! `ReservationService`. Handlers never touch the pool or bus directly —
//! all domain logic lives in `cinerail_core`.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::routing::{delete, get, post};
use axum::Router;
use cinerail_types::api::{
    CancelHoldQuery, CancelHoldResponse, CreateHoldBulkRequest, CreateHoldRequest, HoldResponse,
};
use cinerail_types::AppError;
use uuid::Uuid;
use validator::Validate;

use cinerail_core::ReserveItem;

use crate::middleware::{AppState, OptionalAuthUser};
use crate::response::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reservations", post(create))
        .route("/reservations/multiple", post(create_bulk))
        .route("/reservations/:showtime_id", get(snapshot).delete(cancel))
}

async fn create(
    State(state): State<AppState>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Json(req): Json<CreateHoldRequest>,
) -> Result<Json<HoldResponse>, ApiError> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let user_id = req.user_id.or(user_id);

    let hold = state
        .reservations
        .reserve(req.showtime_id, req.seat_id, &req.session_id, user_id)
        .await?;

    Ok(Json(hold))
}

async fn create_bulk(
    State(state): State<AppState>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Json(req): Json<CreateHoldBulkRequest>,
) -> Result<Json<Vec<HoldResponse>>, ApiError> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let items = req
        .items
        .into_iter()
        .map(|item| ReserveItem {
            showtime_id: item.showtime_id,
            seat_id: item.seat_id,
            session_id: item.session_id,
            user_id: item.user_id.or(user_id),
        })
        .collect();

    let holds = state.reservations.reserve_bulk(items).await?;
    Ok(Json(holds))
}

async fn snapshot(
    State(state): State<AppState>,
    Path(showtime_id): Path<Uuid>,
) -> Result<Json<Vec<HoldResponse>>, ApiError> {
    let holds = state.reservations.snapshot(showtime_id).await?;
    Ok(Json(holds))
}

async fn cancel(
    State(state): State<AppState>,
    Path(showtime_id): Path<Uuid>,
    Query(query): Query<CancelHoldQuery>,
) -> Result<Json<CancelHoldResponse>, ApiError> {
    let seat_ids = query.seat_ids();
    if seat_ids.is_empty() {
        return Err(AppError::BadRequest("seat_ids must contain at least one uuid".into()).into());
    }

    let released = state.reservations.cancel(showtime_id, &seat_ids, &query.session_id).await?;
    Ok(Json(CancelHoldResponse { released_seat_ids: released }))
}
