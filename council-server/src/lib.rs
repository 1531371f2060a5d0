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

//! Council Server
//!
//! HTTP API over the Council store: accounts, workspaces, nodes, messages,
//! persona chat and workspace summaries.

pub mod api;
pub mod auth;
pub mod config;
pub mod store;

use anyhow::Result;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Extension, Router,
};
use http::HeaderValue;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::AppState;
use auth::{auth_middleware, Authenticator, BearerTokenAuth};
use config::{HttpServerConfig, ServerConfig};
use council_summary::{GroqClient, LLMClient, SummaryPipeline};
use store::MemoryStore;

/// Wire the store and LLM client into shared state
pub fn build_state(
    config: &ServerConfig,
    store: Arc<MemoryStore>,
    llm_client: Arc<dyn LLMClient>,
) -> Result<AppState> {
    let secret = config
        .auth
        .jwt_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow::anyhow!("No JWT secret configured"))?;

    let summary = SummaryPipeline::new(
        store.clone(),
        llm_client.clone(),
        config.summary.to_pipeline_config(),
    );

    Ok(AppState {
        store,
        llm_client,
        summary: Arc::new(summary),
        token_auth: Arc::new(BearerTokenAuth::new(secret, config.auth.token_ttl_minutes)),
        bcrypt_cost: config.auth.bcrypt_cost,
    })
}

fn cors_layer(server: &HttpServerConfig) -> CorsLayer {
    if !server.enable_cors {
        return CorsLayer::new();
    }

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if server.cors_origins.is_empty() {
        tracing::warn!("CORS: Allowing all origins. Set cors_origins in production!");
        cors.allow_origin(Any)
    } else {
        tracing::info!("CORS: Allowing origins: {:?}", server.cors_origins);
        let origins: Vec<HeaderValue> = server
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("CORS: Ignoring invalid origin {:?}", origin);
                    None
                }
            })
            .collect();
        cors.allow_origin(origins)
    }
}

/// Build the full application router
pub fn build_router(state: AppState, server: &HttpServerConfig) -> Router {
    let authenticator: Arc<dyn Authenticator> = state.token_auth.clone();

    let authed_routes = Router::new()
        .route("/auth/me", get(api::me))
        .route(
            "/workspaces",
            get(api::list_workspaces).post(api::create_workspace),
        )
        .route(
            "/workspaces/:workspace_id",
            get(api::get_workspace)
                .put(api::update_workspace)
                .delete(api::delete_workspace),
        )
        .route("/nodes", get(api::list_nodes).post(api::create_node))
        .route(
            "/nodes/:node_id",
            get(api::get_node)
                .put(api::update_node)
                .delete(api::delete_node),
        )
        .route(
            "/messages",
            get(api::list_messages).post(api::create_message),
        )
        .route(
            "/messages/:message_id",
            get(api::get_message)
                .put(api::update_message)
                .delete(api::delete_message),
        )
        .route(
            "/summary/workspace/:workspace_id",
            post(api::summarize_workspace),
        )
        .layer(axum_middleware::from_fn(auth_middleware))
        .layer(Extension(authenticator));

    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health_check))
        .route("/auth/register", post(api::register))
        .route("/auth/login", post(api::login))
        .route("/groq/models", get(api::list_models))
        .route("/groq/chat", post(api::chat_with_persona))
        .merge(authed_routes)
        .with_state(state)
        .layer(cors_layer(server))
        // Add tracing
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "council_server=info,council_summary=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.server.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Council Server");

    // Validate configuration
    config.validate()?;

    let store = if config.storage.persist {
        tracing::info!("Opening store at: {:?}", config.storage.data_dir);
        Arc::new(MemoryStore::open(&config.storage.data_dir)?)
    } else {
        tracing::info!("Persistence disabled; using an in-memory store");
        Arc::new(MemoryStore::in_memory())
    };

    let groq = GroqClient::new(config.llm.groq_api_key.clone())
        .with_base_url(config.llm.base_url.clone())
        .with_timeout(config.llm_timeout())?;
    if groq.is_configured() {
        tracing::info!("Groq client configured for {}", config.llm.base_url);
    } else {
        tracing::warn!("GROQ_API_KEY is not set. Persona chat and summaries will fail with 500.");
    }

    let state = build_state(&config, store, Arc::new(groq))?;
    let app = build_router(state, &config.server);

    // Run HTTP server
    let addr = config.socket_addr()?;
    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
