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

//! Summary prompt template

/// Literal schema the model is instructed to follow
pub const REPORT_SCHEMA: &str = r#"{
  "executive_summary": "string - a concise overview of all conversations",
  "key_points": ["string", "string", "string"],
  "sections": [
    {
      "title": "string",
      "content": "string",
      "points": ["string"]
    }
  ],
  "conclusions": "string",
  "recommendations": ["string"]
}"#;

const PREAMBLE: &str = "You are an expert analyst and information synthesizer. \
Your task is to analyze the following conversations and create a well-structured summary report.";

const REQUIREMENTS: &str = "Requirements:
1. Analyze and synthesize content from all conversations
2. Preserve the meaning and context of the original conversations
3. Provide at least 3 key points
4. Group related discussion into sections, each with a title, a short body and its points
5. Recommendations may be an empty array if there are none";

const OUTPUT_RULES: &str = "Return ONLY the JSON object. \
Do not add any explanation before or after it and do not wrap it in code fences.";

/// Build the summary instruction around already-truncated content.
///
/// Pure function of `content`.
pub fn build_summary_prompt(content: &str) -> String {
    let mut prompt = String::with_capacity(
        PREAMBLE.len() + content.len() + REQUIREMENTS.len() + REPORT_SCHEMA.len() + 256,
    );

    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\nInput data:\n");
    prompt.push_str(content);
    prompt.push_str("\n\n");
    prompt.push_str(REQUIREMENTS);
    prompt.push_str("\n\nRespond with a JSON object that follows this schema exactly:\n");
    prompt.push_str(REPORT_SCHEMA);
    prompt.push_str("\n\n");
    prompt.push_str(OUTPUT_RULES);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_content_verbatim() {
        let content = "Workspace: X\n\n=== Conversation 1: A ===\nContent:\n{\"odd\": true}\n";
        let prompt = build_summary_prompt(content);
        assert!(prompt.contains(content));
        assert!(prompt.starts_with(PREAMBLE));
    }

    #[test]
    fn test_prompt_carries_schema_and_output_rules() {
        let prompt = build_summary_prompt("anything");
        assert!(prompt.contains(REPORT_SCHEMA));
        for field in [
            "executive_summary",
            "key_points",
            "sections",
            "conclusions",
            "recommendations",
        ] {
            assert!(prompt.contains(field));
        }
        assert!(prompt.contains("Return ONLY the JSON object"));
        assert!(prompt.contains("code fences"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(build_summary_prompt("same"), build_summary_prompt("same"));
    }
}
