use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use skywings_catalog::PriceBreakdown;
use skywings_core::{BookingContext, LeadPassenger, PassengerPreference};
use skywings_order::seating::load_seat_map;
use tracing::{debug, info};

use crate::{error::AppError, middleware::SessionClaims, state::AppState};

#[derive(Debug, Deserialize)]
struct StartRequest {
    flight_id: i64,
    #[serde(default)]
    passengers: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SeatRequest {
    #[serde(default)]
    seats: Vec<Option<String>>,
}

#[derive(Debug, Serialize)]
struct SeatResponse {
    seats: Vec<Option<String>>,
    rejected: Vec<String>,
    context: BookingContext,
}

#[derive(Debug, Deserialize)]
struct PassengerRequest {
    lead: LeadPassenger,
    #[serde(default)]
    passengers: Vec<PassengerPreference>,
    #[serde(default)]
    billing_country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteParams {
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Serialize)]
struct QuoteResponse {
    flight_id: i64,
    formatted_total: String,
    pricing: PriceBreakdown,
}

/// Routes of the booking funnel; all of them need a session.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/booking/start", post(start_booking))
        .route("/booking/context", get(get_context).delete(clear_context))
        .route("/booking/seats", post(select_seats))
        .route("/booking/passengers", post(capture_passengers))
        .route("/booking/quote", get(quote))
}

async fn load_context(state: &AppState, claims: &SessionClaims) -> Result<BookingContext, AppError> {
    Ok(state
        .contexts
        .load(&claims.sid)
        .await
        .map_err(AppError::repo)?
        .unwrap_or_default())
}

async fn save_context(state: &AppState, claims: &SessionClaims, ctx: &BookingContext) -> Result<(), AppError> {
    state.contexts.save(&claims.sid, ctx).await.map_err(AppError::repo)
}

fn selected_flight(ctx: &BookingContext) -> Result<i64, AppError> {
    ctx.flight_id
        .ok_or_else(|| AppError::ValidationError("No flight selected".to_string()))
}

async fn start_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<StartRequest>,
) -> Result<Json<BookingContext>, AppError> {
    let flight = state
        .flights
        .get(req.flight_id)
        .await
        .map_err(AppError::repo)?
        .ok_or_else(|| AppError::NotFoundError("Flight not found".to_string()))?;

    let mut ctx = load_context(&state, &claims).await?;
    ctx.select_flight(flight.id, req.passengers);
    save_context(&state, &claims, &ctx).await?;

    info!(session_id = %claims.sid, flight_id = flight.id, passengers = ctx.passenger_count, "Booking started");
    Ok(Json(ctx))
}

async fn get_context(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<BookingContext>, AppError> {
    Ok(Json(load_context(&state, &claims).await?))
}

async fn clear_context(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<StatusCode, AppError> {
    state.contexts.clear(&claims.sid).await.map_err(AppError::repo)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn select_seats(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<SeatRequest>,
) -> Result<Json<SeatResponse>, AppError> {
    let mut ctx = load_context(&state, &claims).await?;
    let flight_id = selected_flight(&ctx)?;

    let seat_map = load_seat_map(
        flight_id,
        state.fleet.as_ref(),
        state.records.as_ref(),
        state.bookings.as_ref(),
    )
    .await
    .map_err(AppError::repo)?;

    let rejected = ctx.assign_seats(&req.seats, &seat_map);
    if !rejected.is_empty() {
        debug!(session_id = %claims.sid, ?rejected, "Seat codes dropped");
    }
    save_context(&state, &claims, &ctx).await?;

    Ok(Json(SeatResponse {
        seats: ctx.selected_seats.clone(),
        rejected,
        context: ctx,
    }))
}

async fn capture_passengers(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<PassengerRequest>,
) -> Result<Json<BookingContext>, AppError> {
    let mut ctx = load_context(&state, &claims).await?;
    ctx.capture_passengers(req.lead, req.passengers, req.billing_country)
        .map_err(AppError::core)?;
    save_context(&state, &claims, &ctx).await?;

    if let Some(lead) = &ctx.lead_passenger {
        debug!(
            session_id = %claims.sid,
            email = %skywings_shared::Masked(lead.email.as_str()),
            passengers = ctx.passengers.len(),
            "Passengers captured"
        );
    }
    Ok(Json(ctx))
}

async fn quote(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<QuoteResponse>, AppError> {
    let mut ctx = load_context(&state, &claims).await?;
    let flight_id = selected_flight(&ctx)?;
    let flight = state
        .flights
        .get(flight_id)
        .await
        .map_err(AppError::repo)?
        .ok_or_else(|| AppError::NotFoundError("Flight not found".to_string()))?;

    let country = params.country.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let pricing = state
        .pricing
        .quote(&ctx.fare_request(flight.price_cents, country))
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    ctx.apply_quote(pricing.clone());
    save_context(&state, &claims, &ctx).await?;

    Ok(Json(QuoteResponse {
        flight_id,
        formatted_total: skywings_shared::format_cents(pricing.total_cents),
        pricing,
    }))
}
