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

//! Registration, login and the current-user endpoint

use crate::api::{ApiError, AppState};
use crate::auth::{hash_password, is_plausible_email, verify_password, AuthContext, AuthError};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let email = body.email.trim().to_string();
    if !is_plausible_email(&email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if body.password.is_empty() {
        return Err(ApiError::BadRequest("Password must not be empty".to_string()));
    }
    if state.store.user_by_email(&email).is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    // bcrypt is CPU-bound
    let cost = state.bcrypt_cost;
    let password = body.password;
    let password_hash =
        tokio::task::spawn_blocking(move || hash_password(&password, cost)).await??;

    let user = state
        .store
        .create_user(&email, password_hash)?
        .ok_or_else(|| ApiError::BadRequest("Email already registered".to_string()))?;

    info!(user_id = %user.id, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id.to_string(),
            email: user.email,
        }),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .store
        .user_by_email(body.email.trim())
        .ok_or(AuthError::InvalidCredentials)?;

    let password = body.password;
    let hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?;
    if !valid {
        return Err(AuthError::InvalidCredentials.into());
    }

    let access_token = state.token_auth.issue(&user)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .store
        .user(ctx.user_id)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        id: user.id.to_string(),
        email: user.email,
    }))
}
