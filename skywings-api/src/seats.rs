use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use skywings_catalog::ClassBand;
use skywings_order::seating::load_seat_map;

use crate::{error::AppError, state::AppState};

/// Seat map of one flight as the seat picker draws it.
#[derive(Debug, Serialize)]
pub struct SeatMapResponse {
    pub flight_id: i64,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub aircraft: String,
    pub rows: i32,
    pub layout: String,
    pub class_map: Vec<ClassBand>,
    pub blocked: Vec<String>,
    pub occupied: Vec<String>,
    pub upgrade_prices: BTreeMap<String, i64>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/flights/{id}/seats", get(get_seat_map))
}

async fn get_seat_map(
    State(state): State<AppState>,
    Path(flight_id): Path<i64>,
) -> Result<Json<SeatMapResponse>, AppError> {
    let flight = state
        .flights
        .get(flight_id)
        .await
        .map_err(AppError::repo)?
        .ok_or_else(|| AppError::NotFoundError("flight_not_found".to_string()))?;
    let aircraft_type_id = flight
        .aircraft_type_id
        .ok_or_else(|| AppError::NotFoundError("flight_not_found".to_string()))?;
    let aircraft = state
        .fleet
        .get_aircraft_type(aircraft_type_id)
        .await
        .map_err(AppError::repo)?
        .ok_or_else(|| AppError::NotFoundError("aircraft_not_found".to_string()))?;

    let seat_map = load_seat_map(
        flight.id,
        state.fleet.as_ref(),
        state.records.as_ref(),
        state.bookings.as_ref(),
    )
    .await
    .map_err(AppError::repo)?;

    let upgrade_prices = state
        .pricing
        .upgrade_table()
        .into_iter()
        .map(|(cabin, cents)| (cabin.to_string(), cents))
        .collect();

    Ok(Json(SeatMapResponse {
        flight_id: flight.id,
        flight_number: flight.flight_number(),
        origin: flight.origin.clone(),
        destination: flight.destination.clone(),
        departure: flight.depart_time,
        aircraft: aircraft.name,
        rows: aircraft.total_rows,
        layout: aircraft.layout,
        class_map: aircraft.class_map,
        blocked: seat_map.blocked_codes(),
        occupied: seat_map.occupied_codes(),
        upgrade_prices,
    }))
}
