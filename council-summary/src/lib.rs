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

//! Council Summary
//!
//! Turns the latest message of every node in a workspace into a structured
//! report:
//! - `aggregator`: collect and render the per-node content
//! - `budget`: estimate tokens and truncate to the input budget
//! - `prompt`: wrap the content in the instruction and JSON schema
//! - `synthesizer`: call the model, validate and retry
//! - `pipeline`: the entry point tying them together

pub mod aggregator;
pub mod budget;
pub mod llm_client;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod synthesizer;
pub mod validator;

pub use aggregator::{aggregate, AggregateError, AggregatedContent, ConversationEntry};
pub use budget::{estimate_tokens, truncate, DEFAULT_MAX_INPUT_TOKENS};
pub use llm_client::{
    ChatMessage, ChatRequest, GroqClient, LLMClient, LLMError, LLMResponse, TokenUsage,
    GROQ_BASE_URL,
};
pub use pipeline::{SummaryConfig, SummaryError, SummaryPipeline};
pub use prompt::build_summary_prompt;
pub use report::{SummaryReport, SummarySection};
pub use synthesizer::{
    AttemptFailure, ReportSynthesizer, SynthesisError, SynthesisState, SynthesizerConfig,
    MAX_RETRIES,
};
pub use validator::{validate, ValidatedReport, ValidationError};
