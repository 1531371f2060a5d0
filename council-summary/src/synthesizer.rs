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

//! Report synthesis with bounded retries.
//!
//! Each attempt calls the LLM once, strips code fences, parses JSON and runs
//! the validator. Failed attempts are retried immediately (or after the
//! configured delay) until `max_attempts` is reached. Configuration errors
//! from the client bypass the loop.

use crate::budget::estimate_tokens;
use crate::llm_client::{ChatRequest, LLMClient};
use crate::report::SummaryReport;
use crate::validator::{validate, ValidationError};
use council_core::Persona;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const MAX_RETRIES: u32 = 5;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4000;

/// Why a single attempt did not produce a report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error("{0}")]
    Transport(String),

    #[error("ParseError: {0}")]
    Parse(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("{0}")]
    Configuration(String),

    #[error("Failed to generate a valid summary after {attempts} attempts. Last error: {last_failure}")]
    ExhaustedRetries {
        attempts: u32,
        last_failure: AttemptFailure,
    },
}

pub type AttemptOutcome = Result<SummaryReport, AttemptFailure>;

#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisState {
    /// Attempt number, starting at 1
    Attempting(u32),
    Succeeded(SummaryReport),
    Failed {
        attempts: u32,
        last_failure: AttemptFailure,
    },
}

impl SynthesisState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SynthesisState::Attempting(_))
    }

    /// State after attempt `attempt` finished with `outcome`
    pub fn after_attempt(attempt: u32, outcome: AttemptOutcome, max_attempts: u32) -> Self {
        match outcome {
            Ok(report) => SynthesisState::Succeeded(report),
            Err(last_failure) if attempt >= max_attempts => SynthesisState::Failed {
                attempts: attempt,
                last_failure,
            },
            Err(_) => SynthesisState::Attempting(attempt + 1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SynthesizerConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            model: Persona::orchestrator().model.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            max_attempts: MAX_RETRIES,
            retry_delay: Duration::ZERO,
        }
    }
}

pub struct ReportSynthesizer {
    llm_client: Arc<dyn LLMClient>,
    config: SynthesizerConfig,
}

impl ReportSynthesizer {
    pub fn new(llm_client: Arc<dyn LLMClient>) -> Self {
        Self::with_config(llm_client, SynthesizerConfig::default())
    }

    pub fn with_config(llm_client: Arc<dyn LLMClient>, config: SynthesizerConfig) -> Self {
        Self { llm_client, config }
    }

    pub fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    pub fn ensure_configured(&self) -> Result<(), SynthesisError> {
        self.llm_client
            .ensure_configured()
            .map_err(|e| SynthesisError::Configuration(e.to_string()))
    }

    /// The request sent on every attempt
    pub fn build_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest::single_user(
            self.config.model.clone(),
            prompt,
            self.config.temperature,
            self.config.max_output_tokens,
        )
    }

    /// Check configuration, then run the retry loop
    pub async fn synthesize(&self, prompt: &str) -> Result<SummaryReport, SynthesisError> {
        self.ensure_configured()?;
        self.run_attempts(prompt).await
    }

    /// Retry loop without the configuration pre-check
    pub(crate) async fn run_attempts(&self, prompt: &str) -> Result<SummaryReport, SynthesisError> {
        let max_attempts = self.config.max_attempts.max(1);
        let request = self.build_request(prompt);

        debug!(
            model = %request.model,
            prompt_chars = prompt.chars().count(),
            estimated_tokens = estimate_tokens(prompt),
            "Starting report synthesis"
        );

        let mut state = SynthesisState::Attempting(1);
        loop {
            state = match state {
                SynthesisState::Attempting(attempt) => {
                    if attempt > 1 && !self.config.retry_delay.is_zero() {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                    debug!("Summary attempt {}/{}", attempt, max_attempts);

                    let outcome = self.attempt(&request).await?;
                    match &outcome {
                        Ok(_) => info!("Summary generated successfully (attempt {})", attempt),
                        Err(failure) => warn!("Summary attempt {} failed: {}", attempt, failure),
                    }

                    SynthesisState::after_attempt(attempt, outcome, max_attempts)
                }
                SynthesisState::Succeeded(report) => return Ok(report),
                SynthesisState::Failed {
                    attempts,
                    last_failure,
                } => {
                    return Err(SynthesisError::ExhaustedRetries {
                        attempts,
                        last_failure,
                    })
                }
            };
        }
    }

    /// One LLM call plus parsing. Only fail-fast client errors escape as `Err`.
    async fn attempt(&self, request: &ChatRequest) -> Result<AttemptOutcome, SynthesisError> {
        match self.llm_client.chat(request.clone()).await {
            Ok(response) => Ok(parse_report(&response.content)),
            Err(e) if e.is_fail_fast() => Err(SynthesisError::Configuration(e.to_string())),
            Err(e) => Ok(Err(AttemptFailure::Transport(e.to_string()))),
        }
    }
}

/// Strip an optional ```json / ``` wrapper and surrounding whitespace
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse, validate and normalize one raw model response
pub fn parse_report(raw: &str) -> AttemptOutcome {
    let value: serde_json::Value = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| AttemptFailure::Parse(e.to_string()))?;
    let validated = validate(&value)?;
    Ok(validated.into_report())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm_client::{LLMError, LLMResponse, TokenUsage};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) const VALID_REPORT: &str = r#"{
        "executive_summary": "All nodes agree on a phased rollout.",
        "key_points": ["Phase one in May", "Budget approved", "Hiring starts now"],
        "sections": [
            {"title": "Timeline", "content": "Three phases.", "points": ["May", "July", "October"]}
        ],
        "conclusions": "Go ahead.",
        "recommendations": []
    }"#;

    /// LLM double that replays a script, then repeats the fallback
    pub(crate) struct ScriptedClient {
        script: Mutex<VecDeque<Result<String, LLMError>>>,
        fallback: String,
        configured: bool,
        calls: AtomicUsize,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedClient {
        pub fn new(script: Vec<Result<String, LLMError>>, fallback: &str) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback: fallback.to_string(),
                configured: true,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn always(content: &str) -> Self {
            Self::new(Vec::new(), content)
        }

        pub fn unconfigured() -> Self {
            Self {
                configured: false,
                ..Self::always(VALID_REPORT)
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl LLMClient for ScriptedClient {
        async fn chat(&self, request: ChatRequest) -> Result<LLMResponse, LLMError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let model = request.model.clone();
            self.requests.lock().push(request);

            let next = self
                .script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(self.fallback.clone()));

            next.map(|content| LLMResponse {
                content,
                usage: TokenUsage::default(),
                model,
            })
        }

        fn ensure_configured(&self) -> Result<(), LLMError> {
            if self.configured {
                Ok(())
            } else {
                Err(LLMError::NotConfigured("GROQ_API_KEY is not configured".to_string()))
            }
        }
    }

    fn synthesizer(client: &Arc<ScriptedClient>) -> ReportSynthesizer {
        ReportSynthesizer::new(client.clone())
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let client = Arc::new(ScriptedClient::always(VALID_REPORT));
        let report = synthesizer(&client).synthesize("prompt").await.unwrap();

        assert_eq!(client.calls(), 1);
        assert_eq!(report.conclusions, "Go ahead.");
    }

    #[tokio::test]
    async fn test_retry_then_success_on_fifth_attempt() {
        let script = vec![
            Ok("not json".to_string()),
            Ok("{\"executive_summary\": \"x\"}".to_string()),
            Ok("[]".to_string()),
            Ok("".to_string()),
            Ok(VALID_REPORT.to_string()),
        ];
        let client = Arc::new(ScriptedClient::new(script, "unused"));
        let report = synthesizer(&client).synthesize("prompt").await.unwrap();

        assert_eq!(client.calls(), 5);
        assert_eq!(report, parse_report(VALID_REPORT).unwrap());
        assert_eq!(report.key_points.len(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_carries_last_reason() {
        let script = vec![
            Ok("garbage 1".to_string()),
            Ok("garbage 2".to_string()),
            Ok("garbage 3".to_string()),
            Ok("garbage 4".to_string()),
        ];
        // Fifth attempt parses but misses key points
        let fifth = r#"{"executive_summary": "s", "key_points": ["one"], "sections": [], "conclusions": "c", "recommendations": []}"#;
        let client = Arc::new(ScriptedClient::new(script, fifth));

        let err = synthesizer(&client).synthesize("prompt").await.unwrap_err();
        assert_eq!(client.calls(), 5);
        match err {
            SynthesisError::ExhaustedRetries {
                attempts,
                last_failure,
            } => {
                assert_eq!(attempts, 5);
                assert_eq!(
                    last_failure,
                    AttemptFailure::Validation(ValidationError::TooFewKeyPoints { min: 3, actual: 1 })
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_always_invalid_json_fails_after_max_attempts() {
        let client = Arc::new(ScriptedClient::always("{ not valid"));
        let err = synthesizer(&client).synthesize("prompt").await.unwrap_err();

        assert_eq!(client.calls(), MAX_RETRIES as usize);
        assert!(matches!(
            err,
            SynthesisError::ExhaustedRetries {
                attempts: 5,
                last_failure: AttemptFailure::Parse(_)
            }
        ));
        assert!(err.to_string().contains("after 5 attempts"));
        assert!(err.to_string().contains("ParseError"));
    }

    #[tokio::test]
    async fn test_transport_errors_consume_attempts() {
        let script = vec![
            Err(LLMError::ApiError("502 Bad Gateway".to_string())),
            Err(LLMError::RateLimitExceeded),
        ];
        let client = Arc::new(ScriptedClient::new(script, VALID_REPORT));
        let report = synthesizer(&client).synthesize("prompt").await;

        assert!(report.is_ok());
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_unconfigured_client_is_never_invoked() {
        let client = Arc::new(ScriptedClient::unconfigured());
        let err = synthesizer(&client).synthesize("prompt").await.unwrap_err();

        assert!(matches!(err, SynthesisError::Configuration(_)));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_not_configured_mid_loop_is_reraised() {
        let script = vec![Err(LLMError::NotConfigured("key revoked".to_string()))];
        let client = Arc::new(ScriptedClient::new(script, VALID_REPORT));
        let err = synthesizer(&client).synthesize("prompt").await.unwrap_err();

        assert!(matches!(err, SynthesisError::Configuration(ref msg) if msg == "key revoked"));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_every_attempt_sends_the_same_request() {
        let client = Arc::new(ScriptedClient::new(
            vec![Ok("nope".to_string())],
            VALID_REPORT,
        ));
        synthesizer(&client).synthesize("the prompt").await.unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);

        let request = &requests[0];
        assert_eq!(request.model, Persona::orchestrator().model);
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.max_tokens, 4000);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[0].content, "the prompt");
    }

    #[tokio::test]
    async fn test_custom_attempt_budget() {
        let client = Arc::new(ScriptedClient::always("bad"));
        let config = SynthesizerConfig {
            max_attempts: 2,
            retry_delay: Duration::from_millis(1),
            ..SynthesizerConfig::default()
        };
        let err = ReportSynthesizer::with_config(client.clone(), config)
            .synthesize("p")
            .await
            .unwrap_err();

        assert!(matches!(err, SynthesisError::ExhaustedRetries { attempts: 2, .. }));
        assert_eq!(client.calls(), 2);
    }

    #[test]
    fn test_state_transitions() {
        let report = parse_report(VALID_REPORT).unwrap();
        let failure = AttemptFailure::Parse("eof".to_string());

        assert_eq!(
            SynthesisState::after_attempt(1, Err(failure.clone()), 5),
            SynthesisState::Attempting(2)
        );
        assert_eq!(
            SynthesisState::after_attempt(4, Ok(report.clone()), 5),
            SynthesisState::Succeeded(report)
        );
        let failed = SynthesisState::after_attempt(5, Err(failure.clone()), 5);
        assert!(failed.is_terminal());
        assert_eq!(
            failed,
            SynthesisState::Failed {
                attempts: 5,
                last_failure: failure
            }
        );
        assert!(!SynthesisState::Attempting(3).is_terminal());
    }

    #[test]
    fn test_code_fence_stripping() {
        let fenced = format!("```json\n{}\n```", VALID_REPORT);
        let bare_fence = format!("  ```\n{}\n```  \n", VALID_REPORT);

        let expected = parse_report(VALID_REPORT).unwrap();
        assert_eq!(parse_report(&fenced).unwrap(), expected);
        assert_eq!(parse_report(&bare_fence).unwrap(), expected);

        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_failure_reasons() {
        assert!(matches!(parse_report("hello"), Err(AttemptFailure::Parse(_))));
        assert!(matches!(
            parse_report("{}"),
            Err(AttemptFailure::Validation(ValidationError::MissingField("executive_summary")))
        ));
    }
}
