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

use crate::api::{ApiError, AppState};
use crate::auth::AuthContext;
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use council_summary::SummaryReport;

/// POST /summary/workspace/:workspace_id
///
/// Returns the report as a flat object with the five report fields.
pub async fn summarize_workspace(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(workspace_id): Path<String>,
) -> Result<Json<SummaryReport>, ApiError> {
    let report = state
        .summary
        .summarize_workspace(&workspace_id, ctx.user_id)
        .await?;
    Ok(Json(report))
}
