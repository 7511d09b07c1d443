use axum::http::StatusCode;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

pub mod messages;
pub mod users;

pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Parse an id taken from the request path.
pub(crate) fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::validation("Invalid UUID format"))
}
