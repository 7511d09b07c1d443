//! Auth-related types.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, NOT_LOGGED_IN};
use crate::models::Identity;

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity id)
    pub sub: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Not before timestamp, equal to `iat`
    pub nbf: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Identity resolved from the request's session token.
///
/// Inserted into request extensions by `require_auth`; handlers behind that
/// middleware take it as an extractor.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthenticated(NOT_LOGGED_IN))
    }
}
