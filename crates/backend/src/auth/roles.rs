//! Role gate applied after `require_auth`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use gatehouse_types::Role;

use crate::error::{ApiError, ApiResult, NOT_LOGGED_IN};
use crate::models::Identity;

use super::types::CurrentUser;

/// Allow `identity` only if its role is exactly `required`.
///
/// There is no hierarchy: an admin does not satisfy a `user` requirement.
pub fn authorize(identity: Option<&Identity>, required: Role) -> ApiResult<()> {
    let identity = identity.ok_or_else(|| ApiError::unauthenticated(NOT_LOGGED_IN))?;

    if identity.role != required {
        tracing::debug!(id = %identity.id, role = %identity.role, %required, "Role gate denied");
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

/// Role gate middleware; the required role is the middleware state.
///
/// ```ignore
/// router.route_layer(middleware::from_fn_with_state(Role::User, require_role))
/// ```
pub async fn require_role(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = request.extensions().get::<CurrentUser>().map(|c| &c.0);
    authorize(identity, required)?;
    Ok(next.run(request).await)
}

/// `require_role` fixed to `Role::Admin`, for `axum::middleware::from_fn`.
pub async fn require_admin(request: Request, next: Next) -> ApiResult<Response> {
    require_role(State(Role::Admin), request, next).await
}
