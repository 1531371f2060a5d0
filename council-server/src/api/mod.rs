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

pub mod account;
pub mod groq;
pub mod health;
pub mod messages;
pub mod nodes;
pub mod summary;
pub mod workspaces;

pub use account::{login, me, register};
pub use groq::{chat_with_persona, list_models};
pub use health::{health_check, root};
pub use messages::{create_message, delete_message, get_message, list_messages, update_message};
pub use nodes::{create_node, delete_node, get_node, list_nodes, update_node};
pub use summary::summarize_workspace;
pub use workspaces::{
    create_workspace, delete_workspace, get_workspace, list_workspaces, update_workspace,
};

use crate::auth::{AuthError, BearerTokenAuth};
use crate::store::MemoryStore;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use council_core::{RecordId, StoreError};
use council_summary::{AggregateError, LLMClient, SummaryError, SummaryPipeline};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// API error; always rendered as `{"detail": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Internal(msg) => {
                tracing::error!("Request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse { detail });
        if status == StatusCode::UNAUTHORIZED {
            let challenge = [(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))];
            (status, challenge, body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.status() == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<SummaryError> for ApiError {
    fn from(err: SummaryError) -> Self {
        match err {
            SummaryError::InvalidWorkspaceId(_) => ApiError::BadRequest(err.to_string()),
            SummaryError::Aggregate(AggregateError::Store(store)) => store.into(),
            SummaryError::Aggregate(_) => ApiError::NotFound(err.to_string()),
            SummaryError::Configuration(_) | SummaryError::ExhaustedRetries { .. } => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Parse a path or body id, naming the record kind on failure
pub(crate) fn parse_id(raw: &str, kind: &str) -> Result<RecordId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} id", kind)))
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub llm_client: Arc<dyn LLMClient>,
    pub summary: Arc<SummaryPipeline>,
    pub token_auth: Arc<BearerTokenAuth>,
    pub bcrypt_cost: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_core::InvalidRecordId;

    #[test]
    fn test_summary_errors_map_to_status() {
        let cases = [
            (
                SummaryError::Configuration("GROQ_API_KEY is not configured".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                SummaryError::InvalidWorkspaceId(InvalidRecordId("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                SummaryError::Aggregate(AggregateError::WorkspaceNotFound),
                StatusCode::NOT_FOUND,
            ),
            (
                SummaryError::Aggregate(AggregateError::NoNodes),
                StatusCode::NOT_FOUND,
            ),
            (
                SummaryError::Aggregate(AggregateError::NoMessages),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_parse_id_names_kind() {
        match parse_id("nope", "node") {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "Invalid node id"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(parse_id("65a1b2c3d4e5f60718293a4b", "node").is_ok());
    }
}
