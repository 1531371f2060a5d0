// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Message CRUD.
//!
//! Single-message routes look the message up first and then check the
//! owning node, so a message on someone else's node is a 403 rather than
//! a 404.

use crate::api::{parse_id, ApiError, AppState};
use crate::auth::AuthContext;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use council_core::{Message, RecordId, Sender};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub node_id: String,
    pub sender: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    pub sender: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageQueryParams {
    pub node_id: Option<String>,
}

fn parse_sender(raw: &str) -> Result<Sender, ApiError> {
    raw.parse()
        .map_err(|e: council_core::InvalidSender| ApiError::BadRequest(e.to_string()))
}

fn owned_node(state: &AppState, raw: &str, owner_id: RecordId) -> Result<RecordId, ApiError> {
    let id = parse_id(raw, "node")?;
    state
        .store
        .node(id, owner_id)
        .map(|n| n.id)
        .ok_or_else(|| ApiError::NotFound("Node not found".to_string()))
}

/// Fetch a message the caller may access through its node
fn accessible_message(
    state: &AppState,
    raw: &str,
    owner_id: RecordId,
) -> Result<Message, ApiError> {
    let id = parse_id(raw, "message")?;
    let message = state
        .store
        .message(id)
        .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))?;

    if state.store.node(message.node_id, owner_id).is_none() {
        return Err(ApiError::Forbidden(
            "Not allowed to access this message".to_string(),
        ));
    }
    Ok(message)
}

/// POST /messages
pub async fn create_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let sender = parse_sender(&body.sender)?;
    let node_id = owned_node(&state, &body.node_id, ctx.user_id)?;

    let message = state.store.create_message(node_id, sender, body.content)?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /messages?node_id=
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<MessageQueryParams>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = match params.node_id.as_deref() {
        Some(raw) => {
            let node_id = owned_node(&state, raw, ctx.user_id)?;
            state.store.messages_for_node(node_id)
        }
        None => state.store.messages_for_owner(ctx.user_id),
    };
    Ok(Json(messages))
}

/// GET /messages/:message_id
pub async fn get_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(message_id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    accessible_message(&state, &message_id, ctx.user_id).map(Json)
}

/// PUT /messages/:message_id
pub async fn update_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(message_id): Path<String>,
    Json(body): Json<UpdateMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    let message = accessible_message(&state, &message_id, ctx.user_id)?;
    let sender = body.sender.as_deref().map(parse_sender).transpose()?;

    state
        .store
        .update_message(message.id, sender, body.content)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))
}

/// DELETE /messages/:message_id
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(message_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let message = accessible_message(&state, &message_id, ctx.user_id)?;
    state.store.delete_message(message.id)?;
    Ok(StatusCode::NO_CONTENT)
}
