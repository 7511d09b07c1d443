//! Session resolver: request credentials to an `Identity`.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, INVALID_TOKEN, NOT_LOGGED_IN};
use crate::models::Identity;
use crate::store::IdentityStore;
use crate::AppState;

use super::cookies::{extract_token_from_cookie, ACCESS_COOKIE};
use super::jwt::TokenService;
use super::types::CurrentUser;

/// Middleware function that requires authentication.
///
/// This can be used with `axum::middleware::from_fn_with_state` to protect
/// routes. On success the resolved identity is available to handlers as
/// `CurrentUser`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = resolve_identity(
        request.headers(),
        &state.tokens,
        state.identities.as_ref(),
    )
    .await?;

    request.extensions_mut().insert(CurrentUser(identity));
    Ok(next.run(request).await)
}

/// Resolve the session token carried by `headers`.
///
/// A well-formed `Authorization: Bearer` header wins over the access token
/// cookie. A malformed header falls back to the cookie.
pub async fn resolve_identity(
    headers: &HeaderMap,
    tokens: &TokenService,
    identities: &dyn IdentityStore,
) -> ApiResult<Identity> {
    let token = extract_token_from_header(headers)
        .or_else(|| extract_token_from_cookie(headers, ACCESS_COOKIE))
        .ok_or_else(|| ApiError::unauthenticated(NOT_LOGGED_IN))?;

    let subject = tokens.validate_access(&token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        ApiError::from(e)
    })?;

    let id = Uuid::parse_str(&subject).map_err(|_| {
        tracing::debug!("Access token subject is not an identity id");
        ApiError::unauthenticated(INVALID_TOKEN)
    })?;

    match identities.find_by_id(id).await? {
        Some(identity) if identity.is_active => Ok(identity),
        Some(_) => {
            tracing::debug!(%id, "Token subject is deactivated");
            Err(ApiError::IdentityGone)
        }
        None => Err(ApiError::IdentityGone),
    }
}

/// Token from `Authorization: Bearer <token>`, if the header is well formed.
fn extract_token_from_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let mut fields = value.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some("Bearer"), Some(token), None) => Some(token.to_string()),
        _ => None,
    }
}
