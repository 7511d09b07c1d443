//! Authentication HTTP handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use gatehouse_types::{SignInRequest, SignUpRequest, StatusResponse, TokenResponse};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::cookies::{extract_token_from_cookie, REFRESH_COOKIE};
use super::types::CurrentUser;

/// Register a new account.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StatusResponse>)> {
    let Json(request) = payload?;
    state.auth.register(request).await?;

    Ok((StatusCode::CREATED, Json(StatusResponse::success())))
}

/// Sign in and receive access and refresh cookies.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let tokens = state.auth.sign_in(request).await?;

    Ok((
        state.cookies.sign_in(&tokens.access, &tokens.refresh),
        Json(TokenResponse::success(tokens.access)),
    ))
}

/// Exchange the refresh cookie for a new access token.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let refresh_token = extract_token_from_cookie(&headers, REFRESH_COOKIE)
        .ok_or_else(|| ApiError::unauthenticated("could not find refresh token"))?;

    let access = state.auth.refresh(&refresh_token).await?;

    Ok((
        state.cookies.refreshed(&access),
        Json(TokenResponse::success(access)),
    ))
}

/// Clear session cookies. Outstanding tokens stay valid until they expire.
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> impl IntoResponse {
    tracing::info!(id = %identity.id, "Logged out");
    (state.cookies.cleared(), Json(StatusResponse::success()))
}
