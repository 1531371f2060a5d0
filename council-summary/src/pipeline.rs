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

//! Workspace summary entry point

use crate::aggregator::{aggregate, AggregateError};
use crate::budget::{estimate_tokens, truncate, DEFAULT_MAX_INPUT_TOKENS};
use crate::llm_client::LLMClient;
use crate::prompt::build_summary_prompt;
use crate::report::SummaryReport;
use crate::synthesizer::{AttemptFailure, ReportSynthesizer, SynthesisError, SynthesizerConfig};
use council_core::{ConversationSource, InvalidRecordId, RecordId};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("{0}")]
    Configuration(String),

    #[error("Invalid workspace id")]
    InvalidWorkspaceId(#[source] InvalidRecordId),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("Failed to generate a valid summary after {attempts} attempts. Last error: {last_failure}")]
    ExhaustedRetries {
        attempts: u32,
        last_failure: AttemptFailure,
    },
}

impl From<SynthesisError> for SummaryError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::Configuration(msg) => SummaryError::Configuration(msg),
            SynthesisError::ExhaustedRetries {
                attempts,
                last_failure,
            } => SummaryError::ExhaustedRetries {
                attempts,
                last_failure,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub max_input_tokens: usize,
    pub synthesizer: SynthesizerConfig,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
            synthesizer: SynthesizerConfig::default(),
        }
    }
}

/// Aggregator → budget → prompt → synthesizer.
///
/// Both collaborators are injected so tests can substitute them.
pub struct SummaryPipeline {
    source: Arc<dyn ConversationSource>,
    synthesizer: ReportSynthesizer,
    max_input_tokens: usize,
}

impl SummaryPipeline {
    pub fn new(
        source: Arc<dyn ConversationSource>,
        llm_client: Arc<dyn LLMClient>,
        config: SummaryConfig,
    ) -> Self {
        Self {
            source,
            synthesizer: ReportSynthesizer::with_config(llm_client, config.synthesizer),
            max_input_tokens: config.max_input_tokens,
        }
    }

    /// Summarize the latest message of every node in an owned workspace.
    ///
    /// Checks run in order: LLM configuration, id format, workspace lookup,
    /// nodes, messages. Only then is the model called.
    pub async fn summarize_workspace(
        &self,
        workspace_id: &str,
        owner_id: RecordId,
    ) -> Result<SummaryReport, SummaryError> {
        self.synthesizer.ensure_configured()?;

        let workspace_id: RecordId = workspace_id
            .parse()
            .map_err(SummaryError::InvalidWorkspaceId)?;

        let content = aggregate(self.source.as_ref(), workspace_id, owner_id)?;
        let truncated = truncate(&content.text, self.max_input_tokens);
        let prompt = build_summary_prompt(&truncated);

        info!(
            workspace_id = %workspace_id,
            nodes = content.node_count,
            messages = content.entries.len(),
            estimated_input_tokens = estimate_tokens(&truncated),
            model = %self.synthesizer.config().model,
            "Summarizing workspace"
        );

        let report = self.synthesizer.run_attempts(&prompt).await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tests::FakeSource;
    use crate::synthesizer::tests::{ScriptedClient, VALID_REPORT};
    use council_core::Sender;

    struct Fixture {
        source: Arc<FakeSource>,
        owner: RecordId,
        workspace: RecordId,
    }

    fn fixture() -> Fixture {
        let source = Arc::new(FakeSource::default());
        let owner = source.next_id();
        let workspace = source.add_workspace(owner, "Expansion");
        for (name, latest) in [("Market", "EU first"), ("Money", "Runway ok"), ("Team", "Hire 2")] {
            let node = source.add_node(workspace, owner, name);
            source.add_message(node, Sender::You, "question");
            source.add_message(node, Sender::Ai, latest);
        }
        Fixture {
            source,
            owner,
            workspace,
        }
    }

    fn pipeline(source: &Arc<FakeSource>, client: &Arc<ScriptedClient>) -> SummaryPipeline {
        SummaryPipeline::new(source.clone(), client.clone(), SummaryConfig::default())
    }

    #[tokio::test]
    async fn test_end_to_end_summary() {
        let fx = fixture();
        let client = Arc::new(ScriptedClient::always(VALID_REPORT));

        let report = pipeline(&fx.source, &client)
            .summarize_workspace(&fx.workspace.to_string(), fx.owner)
            .await
            .unwrap();

        assert_eq!(report.executive_summary, "All nodes agree on a phased rollout.");
        assert_eq!(client.calls(), 1);

        let prompt = &client.requests()[0].messages[0].content;
        assert_eq!(prompt.matches("=== Conversation ").count(), 3);
        for latest in ["EU first", "Runway ok", "Hire 2"] {
            assert!(prompt.contains(latest));
        }
        assert!(!prompt.contains("question"));
    }

    #[tokio::test]
    async fn test_configuration_checked_before_id() {
        let fx = fixture();
        let client = Arc::new(ScriptedClient::unconfigured());

        let err = pipeline(&fx.source, &client)
            .summarize_workspace("not-an-id", fx.owner)
            .await
            .unwrap_err();

        assert!(matches!(err, SummaryError::Configuration(_)));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_id_and_lookup_failures_skip_the_model() {
        let fx = fixture();
        let client = Arc::new(ScriptedClient::always(VALID_REPORT));
        let pipeline = pipeline(&fx.source, &client);

        let err = pipeline.summarize_workspace("xyz", fx.owner).await.unwrap_err();
        assert!(matches!(err, SummaryError::InvalidWorkspaceId(_)));

        let stranger = fx.source.next_id();
        let err = pipeline
            .summarize_workspace(&fx.workspace.to_string(), stranger)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SummaryError::Aggregate(AggregateError::WorkspaceNotFound)
        ));

        let empty = fx.source.add_workspace(fx.owner, "empty");
        let err = pipeline
            .summarize_workspace(&empty.to_string(), fx.owner)
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::Aggregate(AggregateError::NoNodes)));

        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_large_workspace_is_truncated_to_budget() {
        let fx = fixture();
        let node = fx.source.add_node(fx.workspace, fx.owner, "Verbose");
        fx.source
            .add_message(node, Sender::Ai, &"long analysis ".repeat(2_000));

        let client = Arc::new(ScriptedClient::always(VALID_REPORT));
        let config = SummaryConfig {
            max_input_tokens: 100,
            ..SummaryConfig::default()
        };
        SummaryPipeline::new(fx.source.clone(), client.clone(), config)
            .summarize_workspace(&fx.workspace.to_string(), fx.owner)
            .await
            .unwrap();

        let prompt = &client.requests()[0].messages[0].content;
        let head = crate::aggregator::render("Expansion", &[]);
        let start = prompt.find(head.as_str()).unwrap();
        let body: String = prompt[start..].chars().take(300).collect();
        assert!(body.ends_with("..."));
        assert!(!prompt.contains("Verbose"));
    }

    #[tokio::test]
    async fn test_exhaustion_maps_to_summary_error() {
        let fx = fixture();
        let client = Arc::new(ScriptedClient::always("no json here"));

        let err = pipeline(&fx.source, &client)
            .summarize_workspace(&fx.workspace.to_string(), fx.owner)
            .await
            .unwrap_err();

        assert!(matches!(err, SummaryError::ExhaustedRetries { attempts: 5, .. }));
        assert_eq!(client.calls(), 5);
    }
}
