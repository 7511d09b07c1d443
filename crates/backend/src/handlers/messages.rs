//! Chat message CRUD, scoped to the calling identity.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use gatehouse_types::{
    CreateMessageRequest, MessageResponse, Sender, StatusResponse, UpdateMessageRequest,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::models::Message;
use crate::store::StoreError;
use crate::AppState;

use super::parse_id;

const MESSAGE_NOT_FOUND: &str = "Message not found";

pub async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> ApiResult<Json<Vec<MessageResponse>>> {
    let messages = state.messages.list_for_owner(identity.id).await?;
    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

pub async fn create_message(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let Json(request) = payload?;
    request.validate()?;

    let message = Message {
        id: Uuid::new_v4(),
        owner_id: identity.id,
        sender: parse_sender(&request.sender)?,
        content: request.content,
        date: Utc::now(),
    };

    let created = state.messages.create_message(message).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn get_message(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let message = owned_message(&state, identity.id, &id).await?;
    Ok(Json(message.into()))
}

pub async fn update_message(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMessageRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let mut message = owned_message(&state, identity.id, &id).await?;
    message.sender = parse_sender(&request.sender)?;
    message.content = request.content;

    let saved = state
        .messages
        .update_message(message)
        .await
        .map_err(not_found_as_message)?;
    Ok(Json(saved.into()))
}

pub async fn delete_message(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let message = owned_message(&state, identity.id, &id).await?;
    state
        .messages
        .delete_message(message.id)
        .await
        .map_err(not_found_as_message)?;

    Ok(Json(StatusResponse::success()))
}

/// Messages of other owners are reported as missing.
async fn owned_message(state: &AppState, owner_id: Uuid, raw_id: &str) -> ApiResult<Message> {
    let id = parse_id(raw_id)?;

    match state.messages.find_message(id).await? {
        Some(message) if message.owner_id == owner_id => Ok(message),
        _ => Err(ApiError::not_found(MESSAGE_NOT_FOUND)),
    }
}

fn parse_sender(raw: &str) -> ApiResult<Sender> {
    raw.parse().map_err(ApiError::Validation)
}

fn not_found_as_message(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::not_found(MESSAGE_NOT_FOUND),
        other => other.into(),
    }
}
