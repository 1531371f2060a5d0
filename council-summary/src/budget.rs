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

//! Character-count token budget.
//!
//! Token counts are approximated as one token per three characters. This is
//! not a tokenizer; the ratio is deliberately conservative so that text heavy
//! in multi-byte characters still fits the model's context window.

/// Characters assumed per token
pub const CHARS_PER_TOKEN: usize = 3;

/// Default input budget for the summary prompt content
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 6000;

/// Appended to truncated text
pub const ELLIPSIS: &str = "...";

/// Estimated token count of `text`, `floor(chars / 3)`
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Truncate `text` to fit `max_tokens`.
///
/// Text within budget is returned unchanged. Otherwise the result is exactly
/// `max_tokens * 3` characters long and ends with [`ELLIPSIS`]. Cuts fall on
/// `char` boundaries but may split words.
pub fn truncate(text: &str, max_tokens: usize) -> String {
    if estimate_tokens(text) <= max_tokens {
        return text.to_string();
    }

    let max_chars = max_tokens.saturating_mul(CHARS_PER_TOKEN);
    let keep = max_chars.saturating_sub(ELLIPSIS.chars().count());

    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_floors() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("ab"), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
    }

    #[test]
    fn test_estimate_counts_chars_not_bytes() {
        // 6 chars, 18 bytes
        assert_eq!(estimate_tokens("日本語日本語"), 2);
    }

    #[test]
    fn test_within_budget_is_identity() {
        let samples = ["", "short", "exactly nine", &"x".repeat(300)];
        for text in samples {
            let budget = estimate_tokens(text);
            assert_eq!(truncate(text, budget), text);
            assert_eq!(truncate(text, budget + 10), text);
        }
    }

    #[test]
    fn test_over_budget_has_exact_length() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(50);
        for max_tokens in [1, 2, 10, 57, 300] {
            let out = truncate(&text, max_tokens);
            assert_eq!(out.chars().count(), max_tokens * 3);
            assert!(out.ends_with(ELLIPSIS));
            assert!(text.starts_with(out.trim_end_matches(ELLIPSIS)));
        }
    }

    #[test]
    fn test_truncation_is_deterministic() {
        let text = "lorem ipsum dolor sit amet ".repeat(100);
        assert_eq!(truncate(&text, 40), truncate(&text, 40));
    }

    #[test]
    fn test_multibyte_truncation_keeps_char_boundaries() {
        let text = "é".repeat(30);
        let out = truncate(&text, 4);
        assert_eq!(out, format!("{}...", "é".repeat(9)));
    }

    #[test]
    fn test_zero_budget_yields_ellipsis() {
        assert_eq!(truncate("abcdef", 0), "...");
        assert_eq!(truncate("ab", 0), "ab");
    }
}
