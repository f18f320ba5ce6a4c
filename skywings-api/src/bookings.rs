use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use skywings_order::{Booking, BookingError, CancelRequest, MyBookings};
use tracing::{info, warn};

use crate::{error::AppError, middleware::SessionClaims, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings/my", get(my_bookings))
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/bookings/{id}/rebook", post(rebook_booking))
}

async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<MyBookings>, AppError> {
    let user_id = claims.user_id()?;
    let bookings = state
        .bookings
        .list_for_user(user_id)
        .await
        .map_err(AppError::repo)?;
    Ok(Json(MyBookings::build(bookings, Utc::now())))
}

async fn owned_booking(state: &AppState, claims: &SessionClaims, id: i64) -> Result<Booking, AppError> {
    let user_id = claims.user_id()?;
    state
        .bookings
        .get_for_user(id, user_id)
        .await
        .map_err(AppError::repo)?
        .ok_or_else(|| AppError::booking(BookingError::NotFound))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<Booking>, AppError> {
    let mut booking = owned_booking(&state, &claims, id).await?;
    let now = Utc::now();

    state
        .manager
        .cancel_booking(&mut booking, &req, now)
        .map_err(AppError::booking)?;
    state.bookings.update(&booking).await.map_err(AppError::repo)?;
    sync_record(&state, &booking, now).await;

    info!(booking_id = booking.id, booking_ref = %booking.booking_reference, "Booking canceled");
    Ok(Json(booking))
}

async fn rebook_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let mut booking = owned_booking(&state, &claims, id).await?;
    let now = Utc::now();

    state
        .manager
        .rebook_booking(&mut booking, now)
        .map_err(AppError::booking)?;
    state.bookings.update(&booking).await.map_err(AppError::repo)?;
    sync_record(&state, &booking, now).await;

    info!(booking_id = booking.id, booking_ref = %booking.booking_reference, "Booking rebooked");
    Ok(Json(booking))
}

/// Mirrors the booking's state onto the record created with it at checkout,
/// so both paths agree on which seats are held.
async fn sync_record(state: &AppState, booking: &Booking, now: DateTime<Utc>) {
    let mut record = match state.records.find_by_ref(&booking.booking_reference).await {
        Ok(Some(record)) => record,
        Ok(None) => return,
        Err(e) => {
            warn!(booking_ref = %booking.booking_reference, error = %e, "Record lookup failed");
            return;
        }
    };

    state.manager.mirror_onto_record(&mut record, booking, now);

    if let Err(e) = state.records.update(&record).await {
        warn!(booking_ref = %booking.booking_reference, error = %e, "Record status not synced");
    }
}
