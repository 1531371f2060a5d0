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

use anyhow::Result;
use council_summary::{SummaryConfig, SynthesizerConfig, GROQ_BASE_URL};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Council Server Configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub llm: LLMConfig,
    #[serde(default)]
    pub summary: SummarySettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpServerConfig {
    /// HTTP API listen address (e.g., "127.0.0.1:8000")
    #[serde(default = "default_http_addr")]
    pub listen_addr: String,

    /// Enable CORS
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,

    /// Allowed CORS origins (empty = allow all)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Emit logs as JSON lines instead of human-readable text
    #[serde(default)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding the store snapshot
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Write a snapshot after every change and reload it at startup
    #[serde(default = "default_persist")]
    pub persist: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HS256 secret for access tokens (required)
    pub jwt_secret: Option<String>,

    /// Access token lifetime
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,

    /// bcrypt work factor for new password hashes
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LLMConfig {
    /// Groq API key; persona chat and summaries are unavailable without it
    pub groq_api_key: Option<String>,

    #[serde(default = "default_groq_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummarySettings {
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Pause between attempts; 0 retries immediately
    #[serde(default)]
    pub retry_delay_ms: u64,
}

// Default values
fn default_http_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_enable_cors() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./council-data")
}

fn default_persist() -> bool {
    true
}

fn default_token_ttl_minutes() -> i64 {
    30
}

fn default_bcrypt_cost() -> u32 {
    crate::auth::DEFAULT_BCRYPT_COST
}

fn default_groq_base_url() -> String {
    GROQ_BASE_URL.to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_max_input_tokens() -> usize {
    council_summary::DEFAULT_MAX_INPUT_TOKENS
}

fn default_max_attempts() -> u32 {
    council_summary::MAX_RETRIES
}

fn default_temperature() -> f32 {
    council_summary::synthesizer::DEFAULT_TEMPERATURE
}

fn default_max_output_tokens() -> u32 {
    council_summary::synthesizer::DEFAULT_MAX_OUTPUT_TOKENS
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_http_addr(),
            enable_cors: default_enable_cors(),
            cors_origins: vec![],
            log_json: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            persist: default_persist(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_minutes: default_token_ttl_minutes(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            base_url: default_groq_base_url(),
            request_timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            max_input_tokens: default_max_input_tokens(),
            max_attempts: default_max_attempts(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            retry_delay_ms: 0,
        }
    }
}

impl SummarySettings {
    /// Pipeline configuration; the model is always the orchestrator persona's
    pub fn to_pipeline_config(&self) -> SummaryConfig {
        SummaryConfig {
            max_input_tokens: self.max_input_tokens,
            synthesizer: SynthesizerConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                max_attempts: self.max_attempts,
                retry_delay: Duration::from_millis(self.retry_delay_ms),
                ..SynthesizerConfig::default()
            },
        }
    }
}

/// Environment variables read by [`ServerConfig::from_env`]
const ENV_HTTP_ADDR: &str = "COUNCIL_HTTP_ADDR";
const ENV_DATA_DIR: &str = "COUNCIL_DATA_DIR";
const ENV_PERSIST: &str = "COUNCIL_PERSIST";
const ENV_ENABLE_CORS: &str = "COUNCIL_ENABLE_CORS";
const ENV_LOG_JSON: &str = "COUNCIL_LOG_JSON";
const ENV_JWT_SECRET: &str = "COUNCIL_JWT_SECRET";
const ENV_TOKEN_TTL: &str = "COUNCIL_TOKEN_TTL_MINUTES";
const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
const ENV_GROQ_BASE_URL: &str = "GROQ_BASE_URL";

impl ServerConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - COUNCIL_HTTP_ADDR: HTTP listen address (default: 127.0.0.1:8000)
    /// - COUNCIL_DATA_DIR: Data directory path (default: ./council-data)
    /// - COUNCIL_PERSIST: Snapshot the store to disk (default: true)
    /// - COUNCIL_ENABLE_CORS: Enable CORS (default: true)
    /// - COUNCIL_LOG_JSON: JSON log lines (default: false)
    /// - COUNCIL_JWT_SECRET: Secret for signing access tokens
    /// - COUNCIL_TOKEN_TTL_MINUTES: Access token lifetime (default: 30)
    /// - GROQ_API_KEY: Groq API key
    /// - GROQ_BASE_URL: Groq endpoint (default: https://api.groq.com/openai/v1)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load configuration with priority: env > file > defaults
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = config_file {
            if path.exists() {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            } else {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
        } else {
            Self::default()
        };

        // Override with environment variables
        config.apply_env();

        Ok(config)
    }

    /// Overlay variables that are explicitly set
    fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var(ENV_HTTP_ADDR) {
            self.server.listen_addr = addr;
        }

        if let Ok(cors) = std::env::var(ENV_ENABLE_CORS) {
            self.server.enable_cors = cors.parse().unwrap_or(true);
        }

        if let Ok(json) = std::env::var(ENV_LOG_JSON) {
            self.server.log_json = json.parse().unwrap_or(false);
        }

        if let Ok(data_dir) = std::env::var(ENV_DATA_DIR) {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(persist) = std::env::var(ENV_PERSIST) {
            self.storage.persist = persist.parse().unwrap_or(true);
        }

        if let Ok(secret) = std::env::var(ENV_JWT_SECRET) {
            self.auth.jwt_secret = Some(secret);
        }

        if let Ok(ttl) = std::env::var(ENV_TOKEN_TTL) {
            if let Ok(val) = ttl.parse() {
                self.auth.token_ttl_minutes = val;
            }
        }

        if let Ok(key) = std::env::var(ENV_GROQ_API_KEY) {
            self.llm.groq_api_key = Some(key);
        }

        if let Ok(base_url) = std::env::var(ENV_GROQ_BASE_URL) {
            self.llm.base_url = base_url;
        }
    }

    /// Parse listen address as SocketAddr
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(self.server.listen_addr.parse()?)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.request_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Validate socket address
        self.socket_addr()?;

        match self.auth.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => {}
            _ => anyhow::bail!("No JWT secret configured (set COUNCIL_JWT_SECRET or auth.jwt_secret)"),
        }

        if self.auth.token_ttl_minutes <= 0 {
            anyhow::bail!("auth.token_ttl_minutes must be positive");
        }

        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            anyhow::bail!("auth.bcrypt_cost must be between 4 and 31");
        }

        if self.summary.max_attempts == 0 {
            anyhow::bail!("summary.max_attempts must be at least 1");
        }

        // Validate data directory is writable
        if self.storage.persist && !self.storage.data_dir.exists() {
            std::fs::create_dir_all(&self.storage.data_dir)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8000");
        assert_eq!(config.auth.token_ttl_minutes, 30);
        assert_eq!(config.auth.bcrypt_cost, 12);
        assert_eq!(config.llm.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.summary.max_input_tokens, 6000);
        assert_eq!(config.summary.max_attempts, 5);
        assert_eq!(config.summary.max_output_tokens, 4000);
        assert_eq!(config.summary.retry_delay_ms, 0);
        assert!(config.llm.groq_api_key.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            listen_addr = "0.0.0.0:9000"

            [auth]
            jwt_secret = "s3cret"

            [summary]
            max_attempts = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert!(config.server.enable_cors);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.auth.token_ttl_minutes, 30);
        assert_eq!(config.summary.max_attempts, 3);
        assert_eq!(config.summary.max_input_tokens, 6000);
        assert!(config.storage.persist);
    }

    #[test]
    fn test_validate_requires_jwt_secret() {
        let mut config = ServerConfig::default();
        config.storage.persist = false;
        assert!(config.validate().is_err());

        config.auth.jwt_secret = Some(String::new());
        assert!(config.validate().is_err());

        config.auth.jwt_secret = Some("secret".to_string());
        assert!(config.validate().is_ok());

        config.server.listen_addr = "not an address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.auth.jwt_secret = Some("secret".to_string());
        config.storage.data_dir = dir.path().join("nested").join("data");

        config.validate().unwrap();
        assert!(config.storage.data_dir.is_dir());
    }

    #[test]
    fn test_pipeline_config_uses_settings() {
        let settings = SummarySettings {
            max_input_tokens: 1000,
            max_attempts: 2,
            temperature: 0.2,
            max_output_tokens: 512,
            retry_delay_ms: 25,
        };
        let pipeline = settings.to_pipeline_config();
        assert_eq!(pipeline.max_input_tokens, 1000);
        assert_eq!(pipeline.synthesizer.max_attempts, 2);
        assert_eq!(pipeline.synthesizer.max_output_tokens, 512);
        assert_eq!(pipeline.synthesizer.retry_delay, Duration::from_millis(25));
        assert_eq!(
            pipeline.synthesizer.model,
            council_core::Persona::orchestrator().model
        );
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("COUNCIL_HTTP_ADDR", "0.0.0.0:8080");
        std::env::set_var("COUNCIL_TOKEN_TTL_MINUTES", "90");

        let config = ServerConfig::from_env();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.auth.token_ttl_minutes, 90);

        std::env::remove_var("COUNCIL_HTTP_ADDR");
        std::env::remove_var("COUNCIL_TOKEN_TTL_MINUTES");
    }
}
