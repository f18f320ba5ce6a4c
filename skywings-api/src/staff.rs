use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use skywings_catalog::fleet::parse_seat_code;
use skywings_catalog::AircraftType;
use skywings_core::status::effective_flight_status;
use skywings_core::{Flight, FlightStatus, NewFlight};
use skywings_order::seating::load_seat_map;
use skywings_order::CustomerLookup;
use tracing::info;

use crate::{error::AppError, state::AppState};

// ============================================================================
// Read models
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FlightSummary {
    pub id: i64,
    pub code: String,
    pub origin: String,
    pub destination: String,
    pub depart_time: DateTime<Utc>,
    pub status: FlightStatus,
    pub seats_total: usize,
    pub seats_booked: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub flights_today: usize,
    pub passengers_today: usize,
    pub completed_flights: usize,
    pub upcoming_flights: usize,
}

#[derive(Debug, Serialize)]
pub struct CustomerRow {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub booking_ref: String,
    pub flight_code: String,
    pub origin: String,
    pub destination: String,
    pub depart_time: String,
    pub seat_code: String,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub flights_today: Vec<FlightSummary>,
    /// Present only when a lookup filter was given
    pub customers: Option<Vec<CustomerRow>>,
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: String,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlockRequest {
    #[serde(default = "default_blocked")]
    blocked: bool,
}

fn default_blocked() -> bool {
    true
}

#[derive(Debug, Serialize)]
struct CreatedFlight {
    flight: Flight,
    seats_created: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/staff/dashboard", get(dashboard))
        .route("/staff/download-today-report", get(download_today_report))
        .route("/staff/download-today-manifest", get(download_today_manifest))
        .route("/staff/flights", post(create_flight))
        .route("/staff/flights/{id}/status", post(update_flight_status))
        .route("/staff/flights/{id}/seats/{code}/block", post(block_seat))
        .route("/staff/aircraft-types", post(create_aircraft_type))
}

/// `[00:00, next 00:00)` of the current UTC day.
fn today_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

async fn flights_today(state: &AppState, now: DateTime<Utc>) -> Result<Vec<Flight>, AppError> {
    let (start, end) = today_window(now);
    let mut flights = state
        .flights
        .list_departing_between(start, end)
        .await
        .map_err(AppError::repo)?;
    flights.sort_by_key(|f| f.depart_time);
    Ok(flights)
}

// ============================================================================
// Dashboard
// ============================================================================

async fn dashboard(
    State(state): State<AppState>,
    Query(lookup): Query<CustomerLookup>,
) -> Result<Json<Dashboard>, AppError> {
    let now = Utc::now();
    let flights = flights_today(&state, now).await?;

    let mut summaries = Vec::with_capacity(flights.len());
    let mut passengers_today = 0;
    for flight in &flights {
        let seats_total = state.fleet.list_seats(flight.id).await.map_err(AppError::repo)?.len();
        let seat_map = load_seat_map(
            flight.id,
            state.fleet.as_ref(),
            state.records.as_ref(),
            state.bookings.as_ref(),
        )
        .await
        .map_err(AppError::repo)?;

        passengers_today += state
            .records
            .list_for_flight(flight.id)
            .await
            .map_err(AppError::repo)?
            .iter()
            .filter(|r| !r.is_canceled())
            .map(|r| r.passengers.len())
            .sum::<usize>();

        summaries.push(FlightSummary {
            id: flight.id,
            code: flight.code(),
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            depart_time: flight.depart_time,
            status: effective_flight_status(flight, now),
            seats_total,
            seats_booked: seat_map.occupied_codes().len(),
        });
    }

    let completed = summaries
        .iter()
        .filter(|f| f.status == FlightStatus::Departed)
        .count();
    let stats = DashboardStats {
        flights_today: summaries.len(),
        passengers_today,
        completed_flights: completed,
        upcoming_flights: summaries.len() - completed,
    };

    let customers = if lookup.is_empty() {
        None
    } else {
        Some(lookup_customers(&state, &lookup.normalized()).await?)
    };

    Ok(Json(Dashboard { stats, flights_today: summaries, customers }))
}

async fn lookup_customers(state: &AppState, lookup: &CustomerLookup) -> Result<Vec<CustomerRow>, AppError> {
    let matches = state.records.lookup(lookup).await.map_err(AppError::repo)?;

    let mut rows = Vec::with_capacity(matches.len());
    for (record, customer) in matches.into_iter().take(CustomerLookup::MAX_ROWS) {
        let Some(flight) = state.flights.get(record.flight_id).await.map_err(AppError::repo)? else {
            continue;
        };
        let seats: Vec<&str> = record.seat_codes().collect();
        rows.push(CustomerRow {
            full_name: customer.full_name(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            booking_ref: record.booking_ref.clone(),
            flight_code: flight.code(),
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            depart_time: flight.depart_time.format("%Y-%m-%d %H:%M").to_string(),
            seat_code: if seats.is_empty() { "-".to_string() } else { seats.join(", ") },
        });
    }
    Ok(rows)
}

// ============================================================================
// CSV downloads
// ============================================================================

fn csv_response(filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        body,
    )
        .into_response()
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, AppError> {
    writer
        .into_inner()
        .map_err(|e| AppError::InternalServerError(format!("CSV flush failed: {}", e)))
}

async fn download_today_report(State(state): State<AppState>) -> Result<Response, AppError> {
    let now = Utc::now();
    let flights = flights_today(&state, now).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Flight Code", "Origin", "Destination", "Departure (UTC)", "Status"])?;
    for flight in &flights {
        writer.write_record([
            flight.code(),
            flight.origin.clone(),
            flight.destination.clone(),
            flight.depart_time.to_rfc3339(),
            effective_flight_status(flight, now).to_string(),
        ])?;
    }

    Ok(csv_response("today_flights.csv", finish_csv(writer)?))
}

async fn download_today_manifest(State(state): State<AppState>) -> Result<Response, AppError> {
    let flights = flights_today(&state, Utc::now()).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Flight Code",
        "Origin",
        "Destination",
        "Departure Time (UTC)",
        "Booking Ref",
        "Seat",
        "Passenger Name",
        "Email",
        "Phone",
    ])?;

    for flight in &flights {
        let records = state
            .records
            .list_for_flight(flight.id)
            .await
            .map_err(AppError::repo)?;

        for record in records.iter().filter(|r| !r.is_canceled()) {
            let customer = match record.customer_id {
                Some(id) => state.records.customer(id).await.map_err(AppError::repo)?,
                None => None,
            };
            let (email, phone) = customer
                .map(|c| (c.email, c.phone.unwrap_or_default()))
                .unwrap_or_default();

            for passenger in &record.passengers {
                writer.write_record([
                    flight.code(),
                    flight.origin.clone(),
                    flight.destination.clone(),
                    flight.depart_time.to_rfc3339(),
                    record.booking_ref.clone(),
                    passenger.seat_code.clone().unwrap_or_else(|| "-".to_string()),
                    passenger.full_name.clone(),
                    email.clone(),
                    phone.clone(),
                ])?;
            }
        }
    }

    Ok(csv_response("today_passenger_manifest.csv", finish_csv(writer)?))
}

// ============================================================================
// Fleet and schedule admin
// ============================================================================

async fn update_flight_status(
    State(state): State<AppState>,
    Path(flight_id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<StatusCode, AppError> {
    let status = req.status.trim();
    if status.is_empty() {
        return Err(AppError::ValidationError("Status is required".to_string()));
    }
    let note = req.note.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let updated = state
        .flights
        .update_status(flight_id, status, note)
        .await
        .map_err(AppError::repo)?;
    if !updated {
        return Err(AppError::NotFoundError("Flight not found".to_string()));
    }

    info!(flight_id, status, "Flight status set");
    Ok(StatusCode::NO_CONTENT)
}

async fn create_aircraft_type(
    State(state): State<AppState>,
    Json(aircraft): Json<AircraftType>,
) -> Result<(StatusCode, Json<AircraftType>), AppError> {
    aircraft
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    let created = state
        .fleet
        .create_aircraft_type(&aircraft)
        .await
        .map_err(AppError::repo)?;

    info!(aircraft_type_id = created.id, code = %created.code, "Aircraft type created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn create_flight(
    State(state): State<AppState>,
    Json(req): Json<NewFlight>,
) -> Result<(StatusCode, Json<CreatedFlight>), AppError> {
    let new_flight = req.normalized().map_err(AppError::core)?;

    let aircraft = match new_flight.aircraft_type_id {
        Some(id) => Some(
            state
                .fleet
                .get_aircraft_type(id)
                .await
                .map_err(AppError::repo)?
                .ok_or_else(|| AppError::NotFoundError("aircraft_not_found".to_string()))?,
        ),
        None => None,
    };

    let flight = state.flights.create(&new_flight).await.map_err(AppError::repo)?;
    let seats_created = match aircraft {
        Some(aircraft) => state
            .fleet
            .create_seats(flight.id, &aircraft.generate_seats())
            .await
            .map_err(AppError::repo)?,
        None => 0,
    };

    info!(flight_id = flight.id, code = %flight.code(), seats_created, "Flight created");
    Ok((StatusCode::CREATED, Json(CreatedFlight { flight, seats_created })))
}

async fn block_seat(
    State(state): State<AppState>,
    Path((flight_id, code)): Path<(i64, String)>,
    Json(req): Json<BlockRequest>,
) -> Result<StatusCode, AppError> {
    let (row, letter) = parse_seat_code(&code)
        .ok_or_else(|| AppError::ValidationError(format!("Invalid seat code: {:?}", code)))?;

    let updated = state
        .fleet
        .set_seat_blocked(flight_id, row, letter, req.blocked)
        .await
        .map_err(AppError::repo)?;
    if !updated {
        return Err(AppError::NotFoundError("Seat not found".to_string()));
    }

    info!(flight_id, seat = %code, blocked = req.blocked, "Seat block changed");
    Ok(StatusCode::NO_CONTENT)
}
