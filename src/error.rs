use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors surfaced to API clients.
///
/// Conflict maps to 403 rather than 409; the login and ownership variants use
/// fixed constructors so that distinguishable causes share one message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Login failure; identical for unknown email and wrong password.
    pub fn invalid_credentials() -> Self {
        Self::Unauthorized("Credentials incorrect")
    }

    /// Missing, malformed, expired, or otherwise unverifiable bearer token.
    pub fn invalid_token() -> Self {
        Self::Unauthorized("Invalid or expired token")
    }

    /// Email already registered.
    pub fn credentials_taken() -> Self {
        Self::Conflict("Credentials already exist")
    }

    /// Resource missing or owned by someone else; the caller cannot tell which.
    pub fn access_denied() -> Self {
        Self::Forbidden("Access to resource denied")
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(anyhow::Error::new(e))
    }
}

/// True when the database rejected a write for violating a unique constraint.
/// Callers that can race past an existence pre-check use this to map the late
/// violation to the same conflict error.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            ApiError::Conflict(msg) => (StatusCode::FORBIDDEN, msg.to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.to_string()),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, message).into_response()
    }
}
