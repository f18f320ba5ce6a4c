use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub const ROLE_GUEST: &str = "GUEST";
pub const ROLE_CUSTOMER: &str = "CUSTOMER";
pub const ROLE_STAFF: &str = "STAFF";

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Stable subject: `guest-{uuid}` or `user-{id}`. Owns booking records.
    pub sub: String,
    /// Session id, the key of the booking context
    pub sid: String,
    pub role: String,
    #[serde(default)]
    pub uid: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

impl SessionClaims {
    pub fn guest(expiration_seconds: u64) -> Self {
        Self {
            sub: format!("guest-{}", Uuid::new_v4()),
            sid: Uuid::new_v4().to_string(),
            role: ROLE_GUEST.to_owned(),
            uid: None,
            email: None,
            exp: expiry(expiration_seconds),
        }
    }

    pub fn user(user_id: i64, email: &str, is_staff: bool, expiration_seconds: u64) -> Self {
        Self {
            sub: format!("user-{}", user_id),
            sid: Uuid::new_v4().to_string(),
            role: if is_staff { ROLE_STAFF } else { ROLE_CUSTOMER }.to_owned(),
            uid: Some(user_id),
            email: Some(email.to_owned()),
            exp: expiry(expiration_seconds),
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role == ROLE_STAFF
    }

    /// Signed-in account id; guests have none.
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.uid
            .ok_or_else(|| AppError::AuthorizationError("A customer account is required".to_string()))
    }
}

fn expiry(expiration_seconds: u64) -> usize {
    (Utc::now() + Duration::seconds(expiration_seconds as i64)).timestamp() as usize
}

pub fn issue_token(state: &AppState, claims: &SessionClaims) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn decode_claims(state: &AppState, token: &str) -> Result<SessionClaims, AppError> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::AuthenticationError(format!("Invalid session token: {}", e)))
}

/// Claims of the request, if it carries a valid token.
pub fn optional_claims(state: &AppState, headers: &HeaderMap) -> Option<SessionClaims> {
    bearer_token(headers).and_then(|token| decode_claims(state, token).ok())
}

fn require_claims(state: &AppState, req: &Request) -> Result<SessionClaims, AppError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;
    decode_claims(state, token)
}

// ============================================================================
// Middleware
// ============================================================================

/// Any valid session, guest or account.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = require_claims(&state, &req)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Signed-in customers (staff accounts included).
pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = require_claims(&state, &req)?;
    if claims.role != ROLE_CUSTOMER && claims.role != ROLE_STAFF {
        return Err(AppError::AuthorizationError("Sign in to continue".to_string()));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub async fn staff_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = require_claims(&state, &req)?;
    if !claims.is_staff() {
        return Err(AppError::AuthorizationError("Forbidden".to_string()));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
