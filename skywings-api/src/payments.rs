use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use serde::Deserialize;
use skywings_core::payment::CardDetails;
use skywings_core::PaymentSource;
use skywings_order::{CheckoutReceipt, CheckoutSession};
use skywings_shared::Masked;

use crate::{error::AppError, middleware::SessionClaims, state::AppState};

#[derive(Debug, Deserialize)]
struct PaypalRequest {
    payer_email: Masked<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments/mock", post(pay_mock))
        .route("/payments/card", post(pay_card))
        .route("/payments/paypal", post(pay_paypal))
}

async fn checkout(
    state: &AppState,
    claims: &SessionClaims,
    source: PaymentSource,
) -> Result<(StatusCode, Json<CheckoutReceipt>), AppError> {
    let session = CheckoutSession {
        session_id: claims.sid.clone(),
        owner: claims.sub.clone(),
        user_id: claims.uid,
    };
    let receipt = state
        .checkout
        .finalize(&session, source)
        .await
        .map_err(|e| {
            tracing::warn!(session_id = %claims.sid, error = %e, "Checkout failed");
            AppError::checkout(e)
        })?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn pay_mock(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<(StatusCode, Json<CheckoutReceipt>), AppError> {
    checkout(&state, &claims, PaymentSource::Mock).await
}

async fn pay_card(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(card): Json<CardDetails>,
) -> Result<(StatusCode, Json<CheckoutReceipt>), AppError> {
    checkout(&state, &claims, PaymentSource::Card(card)).await
}

async fn pay_paypal(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<PaypalRequest>,
) -> Result<(StatusCode, Json<CheckoutReceipt>), AppError> {
    checkout(&state, &claims, PaymentSource::Paypal { payer_email: req.payer_email }).await
}
