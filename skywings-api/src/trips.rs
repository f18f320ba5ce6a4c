use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skywings_order::manager::record_status;
use skywings_order::reference::is_booking_reference;
use skywings_order::{BookingError, BookingRecord, TripGroups, TripView};
use tracing::{info, warn};

use crate::{error::AppError, middleware::SessionClaims, state::AppState};

#[derive(Debug, Deserialize)]
struct TripCancelRequest {
    #[serde(default)]
    booking_ref: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TripRebookRequest {
    #[serde(default)]
    booking_ref: Option<String>,
}

#[derive(Debug, Serialize)]
struct TripCancelResponse {
    ok: bool,
    booking_ref: String,
    status: String,
}

#[derive(Debug, Serialize)]
struct TripRebookResponse {
    ok: bool,
    booking_ref: String,
    status: String,
    price_cents: i64,
    formatted_price: String,
    departure: DateTime<Utc>,
    origin: String,
    destination: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trips", get(list_trips))
        .route("/trips/cancel", post(cancel_trip))
        .route("/trips/rebook", post(rebook_trip))
}

async fn list_trips(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<TripGroups>, AppError> {
    let now = Utc::now();
    let records = state
        .records
        .list_for_owner(&claims.sub)
        .await
        .map_err(AppError::repo)?;

    let mut trips = Vec::with_capacity(records.len());
    for mut record in records {
        let Some(flight) = state.flights.get(record.flight_id).await.map_err(AppError::repo)? else {
            warn!(booking_ref = %record.booking_ref, flight_id = record.flight_id, "Trip without flight skipped");
            continue;
        };

        let status = record_status(&record, &flight, now);
        if record.status.as_deref() != Some(status.as_str()) {
            record.status = Some(status.clone());
            record.updated_at = now;
            if let Err(e) = state.records.update(&record).await {
                warn!(booking_ref = %record.booking_ref, error = %e, "Could not store derived trip status");
            }
        }
        trips.push(TripView::build(&record, &flight, status, now));
    }

    Ok(Json(skywings_order::group_trips(trips, now)))
}

/// Record with the given reference owned by the caller.
async fn owned_record(
    state: &AppState,
    claims: &SessionClaims,
    booking_ref: Option<&str>,
) -> Result<BookingRecord, AppError> {
    let booking_ref = booking_ref
        .map(|r| r.trim().to_ascii_uppercase())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::booking(BookingError::MissingReference))?;
    if !is_booking_reference(&booking_ref) {
        return Err(AppError::booking(BookingError::NotFound));
    }

    state
        .records
        .find_by_ref(&booking_ref)
        .await
        .map_err(AppError::repo)?
        .filter(|record| record.owner == claims.sub)
        .ok_or_else(|| AppError::booking(BookingError::NotFound))
}

async fn cancel_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<TripCancelRequest>,
) -> Result<Json<TripCancelResponse>, AppError> {
    let mut record = owned_record(&state, &claims, req.booking_ref.as_deref()).await?;
    let flight = state
        .flights
        .get(record.flight_id)
        .await
        .map_err(AppError::repo)?
        .ok_or_else(|| AppError::booking(BookingError::NotCancellable))?;
    let now = Utc::now();

    state
        .manager
        .cancel_record(&mut record, &flight, req.reason.as_deref(), now)
        .map_err(AppError::booking)?;
    state.records.update(&record).await.map_err(AppError::repo)?;
    sync_booking(&state, &record, req.reason.as_deref(), now).await;

    info!(booking_ref = %record.booking_ref, "Trip cancelled");
    Ok(Json(TripCancelResponse {
        ok: true,
        status: record.status.clone().unwrap_or_default(),
        booking_ref: record.booking_ref,
    }))
}

async fn rebook_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<TripRebookRequest>,
) -> Result<Json<TripRebookResponse>, AppError> {
    let mut record = owned_record(&state, &claims, req.booking_ref.as_deref()).await?;
    let flight = state
        .flights
        .get(record.flight_id)
        .await
        .map_err(AppError::repo)?
        .ok_or_else(|| AppError::booking(BookingError::FlightUnavailable))?;

    let now = Utc::now();

    state
        .manager
        .rebook_record(&mut record, &flight, now)
        .map_err(AppError::booking)?;
    state.records.update(&record).await.map_err(AppError::repo)?;
    sync_booking(&state, &record, None, now).await;

    info!(booking_ref = %record.booking_ref, flight_id = flight.id, "Trip rebooked");
    Ok(Json(TripRebookResponse {
        ok: true,
        status: record.status.clone().unwrap_or_default(),
        booking_ref: record.booking_ref,
        price_cents: flight.price_cents,
        formatted_price: skywings_shared::format_cents(flight.price_cents),
        departure: flight.depart_time,
        origin: flight.origin,
        destination: flight.destination,
    }))
}

/// Mirrors the record's state onto the account booking checked out with it,
/// so My Bookings and the trips page agree.
async fn sync_booking(state: &AppState, record: &BookingRecord, reason: Option<&str>, now: DateTime<Utc>) {
    let mut booking = match state.bookings.find_by_reference(&record.booking_ref).await {
        Ok(Some(booking)) => booking,
        Ok(None) => return,
        Err(e) => {
            warn!(booking_ref = %record.booking_ref, error = %e, "Booking lookup failed");
            return;
        }
    };

    state.manager.mirror_onto_booking(&mut booking, record, reason, now);
    if let Err(e) = state.bookings.update(&booking).await {
        warn!(booking_ref = %record.booking_ref, error = %e, "Booking status not synced");
    }
}
