use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use skywings_core::account::{normalize_email, verify_password};
use skywings_core::{Registration, User};
use skywings_shared::Masked;

use crate::{error::AppError, middleware::auth::issue_token, middleware::SessionClaims, state::AppState};

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: Masked<String>,
    password: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/guest", post(login_guest))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let claims = SessionClaims::guest(state.auth.expiration);
    let token = issue_token(&state, &claims)?;

    Ok(Json(AuthResponse { token, role: claims.role, user: None }))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<Registration>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    tracing::debug!(email = %req.email, "Registration attempt");
    let new_user = tokio::task::spawn_blocking(move || req.into_new_user())
        .await
        .map_err(|e| AppError::InternalServerError(format!("Password hashing task failed: {}", e)))?
        .map_err(AppError::core)?;
    let user = state.users.create(&new_user).await.map_err(AppError::repo)?;
    tracing::info!(user_id = user.id, "Account created");

    let claims = SessionClaims::user(user.id, &user.email, user.is_staff, state.auth.expiration);
    let token = issue_token(&state, &claims)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse { token, role: claims.role, user: Some(user) }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&req.email.0);
    let user = match state.users.find_by_email(&email).await.map_err(AppError::repo)? {
        Some(user) => {
            let password = req.password.clone();
            let hash = user.password_hash.clone();
            let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
                .await
                .map_err(|e| {
                    AppError::InternalServerError(format!("Password check task failed: {}", e))
                })?;
            verified.then_some(user)
        }
        None => None,
    };

    let Some(user) = user else {
        tracing::warn!(email = %req.email, "Failed login");
        return Err(AppError::AuthenticationError("Invalid email or password".to_string()));
    };

    let claims = SessionClaims::user(user.id, &user.email, user.is_staff, state.auth.expiration);
    let token = issue_token(&state, &claims)?;
    Ok(Json(AuthResponse { token, role: claims.role, user: Some(user) }))
}
