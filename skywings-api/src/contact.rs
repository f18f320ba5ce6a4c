use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;
use skywings_core::{ContactForm, SubscribeForm, Subscriber};
use skywings_shared::Masked;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
struct ContactResponse {
    ok: bool,
    id: i64,
}

#[derive(Debug, Serialize)]
struct SubscribeResponse {
    ok: bool,
    subscriber: Subscriber,
    /// Flight whose payment page the visitor came from, if any.
    return_to_flight: Option<i64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(send_contact))
        .route("/subscribe", post(subscribe))
}

async fn send_contact(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<(StatusCode, Json<ContactResponse>), AppError> {
    let message = form.validate().map_err(AppError::core)?;
    let stored = state.contacts.create(&message).await.map_err(AppError::repo)?;
    tracing::info!(
        id = stored.id,
        email = %Masked(stored.email.as_str()),
        chars = stored.message.chars().count(),
        "Contact message received"
    );
    Ok((StatusCode::CREATED, Json(ContactResponse { ok: true, id: stored.id })))
}

async fn subscribe(
    State(state): State<AppState>,
    Json(form): Json<SubscribeForm>,
) -> Result<(StatusCode, Json<SubscribeResponse>), AppError> {
    let subscriber = form.validate().map_err(AppError::core)?;
    if let Some(flight_id) = subscriber.flight_id {
        if state.flights.get(flight_id).await.map_err(AppError::repo)?.is_none() {
            return Err(AppError::NotFoundError("Flight not found".to_string()));
        }
    }

    let stored = state.subscribers.upsert(&subscriber).await.map_err(AppError::repo)?;
    tracing::info!(
        id = stored.id,
        email = %Masked(stored.email.as_str()),
        flight_id = ?stored.flight_id,
        "Subscribed to updates"
    );
    Ok((
        StatusCode::CREATED,
        Json(SubscribeResponse {
            ok: true,
            return_to_flight: stored.flight_id,
            subscriber: stored,
        }),
    ))
}
