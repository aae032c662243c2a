// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded tool-calling loop.
//!
//! One step is one provider call. When the response requests tools, the
//! assistant turn (text plus `tool_use` blocks) and a user turn carrying the
//! matching `tool_result` blocks are appended, and the loop calls the model
//! again. The loop ends when a response requests no tools or after
//! `max_steps` calls, whichever comes first.

use mnemo_core::MnemoError;
use mnemo_core::traits::ProviderAdapter;
use mnemo_core::types::{ContentBlock, ProviderMessage, ProviderRequest, TokenUsage, ToolUseData};
use tracing::{debug, warn};

use crate::tool::{ToolOutput, ToolRegistry};

/// Result of a completed loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopOutcome {
    /// Text of the final step.
    pub text: String,
    /// Usage summed over every step.
    pub usage: TokenUsage,
    /// Provider calls made.
    pub steps: usize,
    /// Names of the tools invoked, in call order.
    pub tool_calls: Vec<String>,
}

/// Runs `request` against `provider` with the tools in `tools`.
///
/// `on_tool_use` is called with each tool's name once its result is in.
/// Unknown tools and tool errors are returned to the model as error results.
/// A provider error ends the loop and is returned.
pub async fn run_tool_loop(
    provider: &dyn ProviderAdapter,
    tools: &ToolRegistry,
    mut request: ProviderRequest,
    max_steps: usize,
    on_tool_use: &mut (dyn FnMut(&str) + Send),
) -> Result<LoopOutcome, MnemoError> {
    if !tools.is_empty() {
        request.tools = Some(tools.tool_definitions());
    }

    let mut outcome = LoopOutcome::default();
    while outcome.steps < max_steps.max(1) {
        let response = provider.complete(request.clone()).await?;
        outcome.steps += 1;
        outcome.usage.add(response.usage);
        outcome.text = response.content.clone();

        if response.tool_uses.is_empty() {
            return Ok(outcome);
        }

        let mut assistant = Vec::with_capacity(response.tool_uses.len() + 1);
        if !response.content.is_empty() {
            assistant.push(ContentBlock::Text {
                text: response.content.clone(),
            });
        }
        let mut results = Vec::with_capacity(response.tool_uses.len());

        for call in response.tool_uses {
            let output = invoke_tool(tools, &call).await;
            debug!(
                step = outcome.steps,
                tool = %call.name,
                is_error = output.is_error,
                "tool invoked"
            );
            on_tool_use(&call.name);
            outcome.tool_calls.push(call.name.clone());

            results.push(ContentBlock::ToolResult {
                tool_use_id: call.id.clone(),
                content: output.content,
                is_error: output.is_error,
            });
            assistant.push(ContentBlock::ToolUse {
                id: call.id,
                name: call.name,
                input: call.input,
            });
        }

        request.messages.push(ProviderMessage {
            role: "assistant".to_string(),
            content: assistant,
        });
        request.messages.push(ProviderMessage {
            role: "user".to_string(),
            content: results,
        });
    }

    warn!(steps = outcome.steps, "tool step limit reached");
    Ok(outcome)
}

async fn invoke_tool(tools: &ToolRegistry, call: &ToolUseData) -> ToolOutput {
    let Some(tool) = tools.get(&call.name) else {
        return ToolOutput::error(format!("Unknown tool: {}", call.name));
    };
    match tool.invoke(call.input.clone()).await {
        Ok(output) => output,
        Err(e) => {
            warn!(tool = %call.name, error = %e, "tool failed");
            ToolOutput::error(format!("Tool error: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use mnemo_test_utils::{MockProvider, text_response, tool_response};
    use serde_json::json;

    use crate::tool::Tool;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercases text"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({ "type": "object", "properties": { "text": { "type": "string" } } })
        }

        async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MnemoError> {
            match input["text"].as_str() {
                Some(text) => Ok(ToolOutput::ok(text.to_uppercase())),
                None => Err(MnemoError::Internal("upper: missing 'text' field".into())),
            }
        }
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "mock".to_string(),
            system_prompt: Some("be brief".to_string()),
            messages: vec![ProviderMessage::user("shout hello")],
            max_tokens: 256,
            tools: None,
        }
    }

    fn registry() -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(Upper));
        tools
    }

    #[tokio::test]
    async fn text_only_response_is_one_step() {
        let provider = MockProvider::with_texts(&["hello"]);
        let outcome = run_tool_loop(&provider, &registry(), request(), 10, &mut |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.text, "hello");
        assert_eq!(outcome.steps, 1);
        assert!(outcome.tool_calls.is_empty());

        let sent = provider.requests().await;
        let defs = sent[0].tools.as_ref().expect("tool definitions sent");
        assert_eq!(defs[0]["name"], "upper");
    }

    #[tokio::test]
    async fn tool_results_are_fed_back() {
        let provider = MockProvider::with_responses(vec![
            tool_response("upper", json!({"text": "hello"})),
            text_response("HELLO it is"),
        ]);
        let mut seen = Vec::new();
        let outcome = run_tool_loop(&provider, &registry(), request(), 10, &mut |name| {
            seen.push(name.to_string())
        })
        .await
        .unwrap();

        assert_eq!(outcome.text, "HELLO it is");
        assert_eq!(outcome.steps, 2);
        assert_eq!(outcome.tool_calls, vec!["upper"]);
        assert_eq!(seen, vec!["upper"]);
        assert_eq!(outcome.usage.input_tokens, 20);
        assert_eq!(outcome.usage.output_tokens, 40);

        let second = &provider.requests().await[1];
        assert_eq!(second.messages.len(), 3);
        let ContentBlock::ToolUse { id, .. } = &second.messages[1].content[0] else {
            panic!("expected a tool_use block");
        };
        match &second.messages[2].content[0] {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                assert_eq!(tool_use_id, id);
                assert_eq!(content, "HELLO");
                assert!(!is_error);
            }
            other => panic!("expected a tool_result block, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_and_failing_tools_become_error_results() {
        let provider = MockProvider::with_responses(vec![
            tool_response("nonexistent", json!({})),
            tool_response("upper", json!({})),
            text_response("done"),
        ]);
        let outcome = run_tool_loop(&provider, &registry(), request(), 10, &mut |_| {})
            .await
            .unwrap();
        assert_eq!(outcome.text, "done");

        let last = provider.requests().await.pop().unwrap();
        let errors: Vec<&str> = last
            .messages
            .iter()
            .flat_map(|m| &m.content)
            .filter_map(|b| match b {
                ContentBlock::ToolResult {
                    content,
                    is_error: true,
                    ..
                } => Some(content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("Unknown tool: nonexistent"));
        assert!(errors[1].contains("missing 'text'"));
    }

    #[tokio::test]
    async fn step_cap_bounds_provider_calls() {
        let provider = MockProvider::new();
        for _ in 0..5 {
            provider.push(tool_response("upper", json!({"text": "again"}))).await;
        }
        let outcome = run_tool_loop(&provider, &registry(), request(), 3, &mut |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.steps, 3);
        assert_eq!(provider.call_count().await, 3);
        assert_eq!(outcome.tool_calls.len(), 3);
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let provider = MockProvider::new();
        provider.push_error("overloaded").await;
        let err = run_tool_loop(&provider, &registry(), request(), 10, &mut |_| {})
            .await
            .unwrap_err();
        assert!(err.to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn empty_registry_sends_no_definitions() {
        let provider = MockProvider::with_texts(&["ok"]);
        run_tool_loop(&provider, &ToolRegistry::new(), request(), 10, &mut |_| {})
            .await
            .unwrap();
        assert!(provider.requests().await[0].tools.is_none());
    }
}
