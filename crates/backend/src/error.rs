//! Unified error handling for the HTTP API.
//!
//! Every handler and middleware returns `ApiError`, which renders the
//! `{"status":"fail","message":...}` envelope. Domain errors from the
//! hasher, the token service and the record store convert into it with `?`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gatehouse_types::{describe_validation_errors, ErrorResponse};
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::{HashError, TokenError};
use crate::store::StoreError;

pub const INVALID_CREDENTIALS: &str = "Invalid email or Password";
pub const NOT_LOGGED_IN: &str = "You are not logged in";
pub const INVALID_TOKEN: &str = "Invalid or expired token";

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body or path failed validation
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unknown email and wrong password are deliberately indistinguishable
    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials,

    /// Missing, invalid or expired session token
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The token was valid but its subject no longer exists
    #[error("the user belonging to this token no longer exists")]
    IdentityGone,

    #[error("{0}")]
    NotFound(String),

    #[error("You are not allowed to perform this action")]
    Forbidden,

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidCredentials | ApiError::Unauthenticated(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::IdentityGone | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "Internal server error".to_string()
            }
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Conflict(msg) => msg.clone(),
            ApiError::Unauthenticated(msg) => msg.clone(),
            ApiError::NotFound(msg) => msg.clone(),
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::fail(message))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::not_found("Record not found"),
            StoreError::Duplicate => {
                ApiError::Conflict("User with that email already exists".to_string())
            }
            StoreError::Backend(e) => ApiError::Internal(e.context("record store failure")),
        }
    }
}

impl From<HashError> for ApiError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::Mismatch => ApiError::InvalidCredentials,
            other => ApiError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::KeyFormat(_) | TokenError::Signing(_) => {
                ApiError::Internal(anyhow::Error::new(err))
            }
            _ => ApiError::unauthenticated(INVALID_TOKEN),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(describe_validation_errors(&errors))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        ApiError::Validation(rejection.body_text())
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
