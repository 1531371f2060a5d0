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

use crate::api::{parse_id, ApiError, AppState};
use crate::auth::AuthContext;
use crate::store::NodeChanges;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use council_core::{Node, Persona, RecordId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateNodeRequest {
    pub workspace_id: String,
    pub name: String,
    pub persona_id: u8,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNodeRequest {
    pub workspace_id: Option<String>,
    pub name: Option<String>,
    pub persona_id: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct NodeQueryParams {
    pub workspace_id: Option<String>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Node not found".to_string())
}

/// Parse a workspace id and check the caller owns it
fn owned_workspace(state: &AppState, raw: &str, owner_id: RecordId) -> Result<RecordId, ApiError> {
    let id = parse_id(raw, "workspace")?;
    state
        .store
        .workspace(id, owner_id)
        .map(|w| w.id)
        .ok_or_else(|| ApiError::NotFound("Workspace not found".to_string()))
}

fn check_persona(persona_id: u8) -> Result<(), ApiError> {
    match Persona::lookup(persona_id) {
        Some(_) => Ok(()),
        None => Err(ApiError::BadRequest(format!(
            "Invalid persona id {}: choose from 1-6",
            persona_id
        ))),
    }
}

/// POST /nodes
pub async fn create_node(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<CreateNodeRequest>,
) -> Result<(StatusCode, Json<Node>), ApiError> {
    let workspace_id = owned_workspace(&state, &body.workspace_id, ctx.user_id)?;
    check_persona(body.persona_id)?;

    let node = state
        .store
        .create_node(ctx.user_id, workspace_id, body.name, body.persona_id)?;
    Ok((StatusCode::CREATED, Json(node)))
}

/// GET /nodes?workspace_id=
pub async fn list_nodes(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<NodeQueryParams>,
) -> Result<Json<Vec<Node>>, ApiError> {
    let workspace_id = params
        .workspace_id
        .as_deref()
        .map(|raw| owned_workspace(&state, raw, ctx.user_id))
        .transpose()?;

    Ok(Json(state.store.nodes_for_owner(ctx.user_id, workspace_id)))
}

/// GET /nodes/:node_id
pub async fn get_node(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(node_id): Path<String>,
) -> Result<Json<Node>, ApiError> {
    let id = parse_id(&node_id, "node")?;
    state
        .store
        .node(id, ctx.user_id)
        .map(Json)
        .ok_or_else(not_found)
}

/// PUT /nodes/:node_id
pub async fn update_node(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(node_id): Path<String>,
    Json(body): Json<UpdateNodeRequest>,
) -> Result<Json<Node>, ApiError> {
    let id = parse_id(&node_id, "node")?;
    if state.store.node(id, ctx.user_id).is_none() {
        return Err(not_found());
    }

    let workspace_id = body
        .workspace_id
        .as_deref()
        .map(|raw| owned_workspace(&state, raw, ctx.user_id))
        .transpose()?;
    if let Some(persona_id) = body.persona_id {
        check_persona(persona_id)?;
    }

    let changes = NodeChanges {
        workspace_id,
        name: body.name,
        persona_id: body.persona_id,
    };
    state
        .store
        .update_node(id, ctx.user_id, changes)?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /nodes/:node_id
pub async fn delete_node(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(node_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&node_id, "node")?;
    if state.store.delete_node(id, ctx.user_id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
