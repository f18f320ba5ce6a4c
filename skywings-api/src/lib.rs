use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{Method, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod account;
pub mod auth;
pub mod booking;
pub mod bookings;
pub mod contact;
pub mod error;
pub mod middleware;
pub mod payments;
pub mod reports;
pub mod search;
pub mod seats;
pub mod staff;
pub mod state;
pub mod trips;

pub use state::AppState;

const RATE_LIMIT_WINDOW_SECS: u64 = 60;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let session = Router::new()
        .merge(booking::routes())
        .merge(payments::routes())
        .merge(trips::routes())
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::session_auth_middleware,
        ));

    let customer = Router::new()
        .merge(bookings::routes())
        .merge(account::routes())
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::customer_auth_middleware,
        ));

    let staff = staff::routes().route_layer(from_fn_with_state(
        state.clone(),
        middleware::staff_auth_middleware,
    ));

    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(search::routes())
        .merge(seats::routes())
        .merge(reports::routes())
        .merge(contact::routes())
        .merge(session)
        .merge(customer)
        .merge(staff)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn_with_state(state.clone(), rate_limit_middleware)),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Fixed window per client address. Backend errors let the request through.
async fn rate_limit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let limit = state.business_rules.rate_limit_per_minute;
    match state.rate_limiter.check(&ip, limit, RATE_LIMIT_WINDOW_SECS).await {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            tracing::warn!(ip = %ip, "Rate limit exceeded");
            (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "error": "Rate limit exceeded" }))).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rate limiter unavailable");
            next.run(req).await
        }
    }
}
