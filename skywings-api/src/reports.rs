use axum::{extract::State, routing::get, Json, Router};
use skywings_core::RouteCount;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/reports/route-popularity", get(route_popularity))
}

/// Flights per route, busiest first.
async fn route_popularity(State(state): State<AppState>) -> Result<Json<Vec<RouteCount>>, AppError> {
    let mut routes = state.flights.route_popularity().await.map_err(AppError::repo)?;
    routes.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.origin.cmp(&b.origin))
            .then_with(|| a.destination.cmp(&b.destination))
    });
    Ok(Json(routes))
}
