//! Profile of the current user and admin user management.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;
use gatehouse_types::{StatusResponse, UpdateUserRequest, UserResponse};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::models::Identity;
use crate::store::StoreError;
use crate::AppState;

use super::parse_id;

const USER_NOT_FOUND: &str = "User not found";

pub async fn me(CurrentUser(identity): CurrentUser) -> Json<UserResponse> {
    Json(identity.into())
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state.identities.list().await?;
    if users.is_empty() {
        return Err(ApiError::not_found("no users found"));
    }

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let id = parse_id(&id)?;
    let identity = state
        .identities
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    Ok(Json(identity.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    request.validate()?;

    let identity = state
        .identities
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    let updated = apply_update(identity, request)?;

    match state.identities.update(updated).await {
        Ok(saved) => {
            tracing::info!(id = %saved.id, role = %saved.role, "Updated user");
            Ok(Json(saved.into()))
        }
        Err(StoreError::NotFound) => Err(ApiError::not_found(USER_NOT_FOUND)),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let id = parse_id(&id)?;

    match state.identities.delete(id).await {
        Ok(()) => {
            tracing::info!(%id, "Deleted user");
            Ok(Json(StatusResponse::success()))
        }
        Err(StoreError::NotFound) => Err(ApiError::not_found(USER_NOT_FOUND)),
        Err(e) => Err(e.into()),
    }
}

/// Profile fields of `request` applied over `identity`. The credential hash
/// and verification flag are never touched here.
fn apply_update(mut identity: Identity, request: UpdateUserRequest) -> ApiResult<Identity> {
    identity.gender = request.gender.parse().map_err(ApiError::Validation)?;
    identity.role = request.role.parse().map_err(ApiError::Validation)?;
    identity.first_name = request.first_name;
    identity.name = request.name;
    identity.birthday = request.birthday;
    identity.email = request.email.trim().to_lowercase();
    identity.address = request.address;
    identity.subscription_code = request.subscription_code;
    if let Some(active) = request.is_active {
        identity.is_active = active;
    }
    identity.updated_at = Utc::now();

    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_identity;
    use gatehouse_types::{Gender, Role};

    fn request() -> UpdateUserRequest {
        let identity = sample_identity();
        UpdateUserRequest {
            first_name: "Amazing".to_string(),
            name: "Grace".to_string(),
            birthday: identity.birthday,
            gender: "female".to_string(),
            email: "Amazing.Grace@Example.com".to_string(),
            role: "admin".to_string(),
            address: Some("Arlington".to_string()),
            subscription_code: None,
            is_active: None,
        }
    }

    #[test]
    fn test_apply_update_keeps_credentials() {
        let identity = sample_identity();
        let updated = apply_update(identity.clone(), request()).unwrap();

        assert_eq!(updated.id, identity.id);
        assert_eq!(updated.password_hash, identity.password_hash);
        assert_eq!(updated.email, "amazing.grace@example.com");
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.gender, Gender::Female);
        assert_eq!(updated.address.as_deref(), Some("Arlington"));
        assert_eq!(updated.subscription_code, None);
        assert!(updated.is_active);
        assert!(updated.updated_at >= identity.updated_at);
    }

    #[test]
    fn test_apply_update_can_deactivate() {
        let mut req = request();
        req.is_active = Some(false);
        let updated = apply_update(sample_identity(), req).unwrap();
        assert!(!updated.is_active);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let mut req = request();
        req.role = "root".to_string();
        assert!(req.validate().is_err());
        assert!(matches!(
            apply_update(sample_identity(), req),
            Err(ApiError::Validation(_))
        ));
    }
}
