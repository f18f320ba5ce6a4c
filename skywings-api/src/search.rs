use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use skywings_core::search::{FlightOption, FlightSearchResult};
use skywings_core::{FlightSearchParams, FlightSearchQuery, RepoResult};
use tracing::{info, warn};

use crate::{error::AppError, middleware::auth::optional_claims, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/flights/search", get(search_flights))
}

async fn search_flights(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FlightSearchParams>,
) -> Result<Json<FlightSearchResult>, AppError> {
    let query = FlightSearchQuery::from_params(&params).map_err(AppError::core)?;

    if let Some(claims) = optional_claims(&state, &headers) {
        if let Err(e) = remember_filters(&state, &claims.sid, &params).await {
            warn!(session_id = %claims.sid, error = %e, "Could not record search filters");
        }
    }

    if query.is_empty() {
        return Ok(Json(FlightSearchResult { searched: false, flights: Vec::new() }));
    }

    let mut flights = state.flights.search(&query).await.map_err(AppError::repo)?;
    flights.sort_by_key(|f| f.depart_time);

    let now = Utc::now();
    let options: Vec<FlightOption> = flights
        .iter()
        .filter(|f| query.matches(f))
        .map(|f| FlightOption::from_flight(f, now))
        .collect();

    info!(
        origin = ?query.origin,
        destination = ?query.destination,
        date = ?query.date,
        results = options.len(),
        "Flight search"
    );

    Ok(Json(FlightSearchResult { searched: true, flights: options }))
}

async fn remember_filters(state: &AppState, session_id: &str, params: &FlightSearchParams) -> RepoResult<()> {
    let mut ctx = state.contexts.load(session_id).await?.unwrap_or_default();
    ctx.record_search(params.clone());
    state.contexts.save(session_id, &ctx).await
}
