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
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use council_core::Workspace;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkspaceRequest {
    pub name: Option<String>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Workspace not found".to_string())
}

/// POST /workspaces
pub async fn create_workspace(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<CreateWorkspaceRequest>,
) -> Result<(StatusCode, Json<Workspace>), ApiError> {
    let workspace = state.store.create_workspace(ctx.user_id, body.name)?;
    Ok((StatusCode::CREATED, Json(workspace)))
}

/// GET /workspaces
pub async fn list_workspaces(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Json<Vec<Workspace>> {
    Json(state.store.workspaces_for_owner(ctx.user_id))
}

/// GET /workspaces/:workspace_id
pub async fn get_workspace(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(workspace_id): Path<String>,
) -> Result<Json<Workspace>, ApiError> {
    let id = parse_id(&workspace_id, "workspace")?;
    state
        .store
        .workspace(id, ctx.user_id)
        .map(Json)
        .ok_or_else(not_found)
}

/// PUT /workspaces/:workspace_id
pub async fn update_workspace(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(workspace_id): Path<String>,
    Json(body): Json<UpdateWorkspaceRequest>,
) -> Result<Json<Workspace>, ApiError> {
    let id = parse_id(&workspace_id, "workspace")?;
    state
        .store
        .update_workspace(id, ctx.user_id, body.name)?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /workspaces/:workspace_id
pub async fn delete_workspace(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(workspace_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&workspace_id, "workspace")?;
    if state.store.delete_workspace(id, ctx.user_id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
