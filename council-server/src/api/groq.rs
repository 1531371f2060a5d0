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

//! Persona catalogue and direct single-turn chat

use crate::api::{ApiError, AppState};
use axum::{extract::State, Json};
use council_core::Persona;
use council_summary::ChatRequest;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const CHAT_TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 2048;

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: &'static [Persona],
}

#[derive(Debug, Deserialize)]
pub struct PersonaChatRequest {
    pub persona_id: u8,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PersonaChatResponse {
    pub persona_id: u8,
    pub persona_name: &'static str,
    pub response: String,
}

/// GET /groq/models
pub async fn list_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: Persona::all(),
    })
}

/// POST /groq/chat
pub async fn chat_with_persona(
    State(state): State<AppState>,
    Json(body): Json<PersonaChatRequest>,
) -> Result<Json<PersonaChatResponse>, ApiError> {
    state
        .llm_client
        .ensure_configured()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let persona = Persona::lookup(body.persona_id).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Invalid persona id {}: choose from 1-6",
            body.persona_id
        ))
    })?;

    let request =
        ChatRequest::single_user(persona.model, body.message, CHAT_TEMPERATURE, CHAT_MAX_TOKENS);

    let response = state.llm_client.chat(request).await.map_err(|e| {
        warn!(persona = persona.id, "Persona chat failed: {}", e);
        ApiError::Internal(format!("Groq API call failed: {}", e))
    })?;

    info!(
        persona = persona.id,
        completion_tokens = response.usage.completion_tokens,
        "Persona chat completed"
    );

    Ok(Json(PersonaChatResponse {
        persona_id: persona.id,
        persona_name: persona.name,
        response: response.content,
    }))
}
