use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use skywings_core::{CoreError, PaymentError, RepoError};
use skywings_order::{BookingError, CheckoutError};

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    pub fn core(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => AppError::ValidationError(msg),
            CoreError::InternalError(msg) => AppError::InternalServerError(msg),
        }
    }

    /// Duplicates are the caller's problem, everything else is ours.
    pub fn repo(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate(msg) => AppError::ConflictError(msg),
            other => AppError::Anyhow(other.into()),
        }
    }

    pub fn booking(err: BookingError) -> Self {
        match err {
            BookingError::NotFound => AppError::NotFoundError(err.to_string()),
            _ => AppError::ValidationError(err.to_string()),
        }
    }

    pub fn payment(err: PaymentError) -> Self {
        AppError::ValidationError(err.to_string())
    }

    pub fn checkout(err: CheckoutError) -> Self {
        match err {
            CheckoutError::NoFlightSelected | CheckoutError::FlightDeparted => {
                AppError::ValidationError(err.to_string())
            }
            CheckoutError::FlightNotFound(_) => AppError::NotFoundError(err.to_string()),
            CheckoutError::Payment(e) => AppError::payment(e),
            CheckoutError::Pricing(e) => AppError::ValidationError(e.to_string()),
            CheckoutError::Repository(e) => AppError::repo(e),
            CheckoutError::ReferencesExhausted(_) => AppError::InternalServerError(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
