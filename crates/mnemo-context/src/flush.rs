// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory flush: a silent sub-turn that lets the model save facts before the
//! conversation outgrows its context window.
//!
//! Token counts are estimated at four characters per token. The estimate
//! only gates the flush threshold.

use mnemo_config::model::ContextConfig;
use mnemo_core::MnemoError;
use mnemo_core::traits::ProviderAdapter;
use mnemo_core::types::{ContentBlock, ProviderMessage, ProviderRequest};
use mnemo_tools::{ToolRegistry, run_tool_loop};
use tracing::{debug, info};

/// Flush once the estimate reaches this fraction of the context window.
pub const DEFAULT_FLUSH_THRESHOLD: f64 = 0.75;

/// Provider calls allowed in one flush sub-turn.
pub const FLUSH_MAX_STEPS: usize = 5;

/// Exact reply meaning "nothing worth saving".
pub const NO_REPLY: &str = "NO_REPLY";

const CHARS_PER_TOKEN: usize = 4;

const FLUSH_SYSTEM_PROMPT: &str = "You are the memory keeper for a personal assistant. \
The conversation is about to be compacted and older messages will be lost. \
Your only job is to persist durable facts: the user's preferences, people and \
places they mention, commitments, decisions and ongoing tasks. Use the \
memory_write tool to update MEMORY.md under fitting ## headings, keeping \
existing sections intact. Do not talk to the user.";

const FLUSH_USER_PROMPT: &str = "Before this conversation is compacted, save anything \
important from it to memory with the memory_write tool. If there is nothing new \
worth saving, reply with exactly NO_REPLY.";

/// Approximate token count of every text-bearing block.
pub fn estimate_tokens(messages: &[ProviderMessage]) -> usize {
    let chars: usize = messages
        .iter()
        .flat_map(|m| &m.content)
        .map(|block| match block {
            ContentBlock::Text { text } => text.chars().count(),
            ContentBlock::ToolResult { content, .. } => content.chars().count(),
            ContentBlock::Image { .. } | ContentBlock::ToolUse { .. } => 0,
        })
        .sum();
    chars / CHARS_PER_TOKEN
}

/// Whether `messages` have reached `threshold` of `context_window` tokens.
pub fn should_flush(messages: &[ProviderMessage], context_window: u32, threshold: f64) -> bool {
    let tokens = estimate_tokens(messages) as f64;
    tokens >= threshold * f64::from(context_window)
}

/// Flush parameters taken from `[context]` config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlushSettings {
    pub threshold: f64,
    pub max_tokens: u32,
}

impl Default for FlushSettings {
    fn default() -> Self {
        Self::from(&ContextConfig::default())
    }
}

impl From<&ContextConfig> for FlushSettings {
    fn from(config: &ContextConfig) -> Self {
        Self {
            threshold: config.flush_threshold,
            max_tokens: config.flush_max_tokens,
        }
    }
}

/// Runs the flush sub-turn over `messages` and reports whether the model
/// saved something (its final reply does not contain [`NO_REPLY`]).
///
/// The sub-turn's text is discarded; its effect is whatever the tools wrote.
pub async fn run_memory_flush(
    provider: &dyn ProviderAdapter,
    model: &str,
    tools: &ToolRegistry,
    messages: &[ProviderMessage],
    max_tokens: u32,
) -> Result<bool, MnemoError> {
    let mut conversation = messages.to_vec();
    conversation.push(ProviderMessage::user(FLUSH_USER_PROMPT));

    let request = ProviderRequest {
        model: model.to_string(),
        system_prompt: Some(FLUSH_SYSTEM_PROMPT.to_string()),
        messages: conversation,
        max_tokens,
        tools: None,
    };

    let outcome = run_tool_loop(provider, tools, request, FLUSH_MAX_STEPS, &mut |name| {
        debug!(tool = name, "flush tool call")
    })
    .await?;

    let saved = !outcome.text.contains(NO_REPLY);
    info!(
        saved,
        steps = outcome.steps,
        tool_calls = outcome.tool_calls.len(),
        "memory flush finished"
    );
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chars(n: usize) -> Vec<ProviderMessage> {
        vec![ProviderMessage::user("x".repeat(n))]
    }

    #[test]
    fn gating_at_seventy_and_eighty_percent() {
        let window = 10_000;
        // 70% of 10k tokens at 4 chars per token
        assert!(!should_flush(&chars(28_000), window, DEFAULT_FLUSH_THRESHOLD));
        assert!(should_flush(&chars(32_000), window, DEFAULT_FLUSH_THRESHOLD));
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(should_flush(&chars(3_000), 1_000, 0.75));
        assert!(!should_flush(&chars(2_996), 1_000, 0.75));
    }

    #[test]
    fn estimate_counts_text_and_tool_results() {
        let messages = vec![
            ProviderMessage::user("abcd"),
            ProviderMessage {
                role: "assistant".into(),
                content: vec![ContentBlock::ToolUse {
                    id: "t1".into(),
                    name: "memory_search".into(),
                    input: serde_json::json!({"query": "a long query that is not counted"}),
                }],
            },
            ProviderMessage {
                role: "user".into(),
                content: vec![ContentBlock::ToolResult {
                    tool_use_id: "t1".into(),
                    content: "efghijkl".into(),
                    is_error: false,
                }],
            },
        ];
        assert_eq!(estimate_tokens(&messages), 3);
        assert_eq!(estimate_tokens(&[]), 0);
    }

    #[test]
    fn estimate_counts_chars_not_bytes() {
        assert_eq!(estimate_tokens(&[ProviderMessage::user("ééééé")]), 1);
    }

    #[test]
    fn settings_follow_config() {
        let settings = FlushSettings::default();
        assert_eq!(settings.threshold, DEFAULT_FLUSH_THRESHOLD);
        assert_eq!(settings.max_tokens, 1024);
    }

    proptest! {
        #[test]
        fn gating_is_monotonic(a in 0usize..20_000, b in 0usize..20_000, window in 1u32..5_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            if should_flush(&chars(lo), window, DEFAULT_FLUSH_THRESHOLD) {
                prop_assert!(should_flush(&chars(hi), window, DEFAULT_FLUSH_THRESHOLD));
            }
        }
    }
}
