use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use skywings_core::{NewTraveler, ProfileUpdate, Traveler, User};

use crate::{error::AppError, middleware::SessionClaims, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/account/profile", get(get_profile).put(update_profile))
        .route("/account/travelers", get(list_travelers).post(create_traveler))
        .route("/account/travelers/{id}", delete(delete_traveler))
}

async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<User>, AppError> {
    let user = state
        .users
        .get(claims.user_id()?)
        .await
        .map_err(AppError::repo)?
        .ok_or_else(|| AppError::NotFoundError("Account not found".to_string()))?;
    Ok(Json(user))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let user = state
        .users
        .update_profile(claims.user_id()?, &update.normalized())
        .await
        .map_err(AppError::repo)?
        .ok_or_else(|| AppError::NotFoundError("Account not found".to_string()))?;
    tracing::info!(user_id = user.id, "Profile updated");
    Ok(Json(user))
}

async fn list_travelers(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Vec<Traveler>>, AppError> {
    let travelers = state
        .travelers
        .list(claims.user_id()?)
        .await
        .map_err(AppError::repo)?;
    Ok(Json(travelers))
}

async fn create_traveler(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<NewTraveler>,
) -> Result<(StatusCode, Json<Traveler>), AppError> {
    let traveler = req.normalized().map_err(AppError::core)?;
    let traveler = state
        .travelers
        .create(claims.user_id()?, &traveler)
        .await
        .map_err(AppError::repo)?;
    Ok((StatusCode::CREATED, Json(traveler)))
}

async fn delete_traveler(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .travelers
        .delete(claims.user_id()?, id)
        .await
        .map_err(AppError::repo)?;
    if !deleted {
        return Err(AppError::NotFoundError("Traveler not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
