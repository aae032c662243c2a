// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mnemo_context::{NO_REPLY, run_memory_flush};
use mnemo_core::MnemoError;
use mnemo_core::types::ProviderMessage;
use mnemo_test_utils::{MockProvider, text_response, tool_response};
use mnemo_tools::{Tool, ToolOutput, ToolRegistry};
use serde_json::json;

/// Records every write instead of touching disk.
#[derive(Default)]
struct RecordingWrite {
    writes: Mutex<Vec<String>>,
}

#[async_trait]
impl Tool for RecordingWrite {
    fn name(&self) -> &str {
        "memory_write"
    }

    fn description(&self) -> &str {
        "records writes"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MnemoError> {
        let content = input["content"].as_str().unwrap_or_default().to_string();
        self.writes.lock().unwrap().push(content);
        Ok(ToolOutput::ok("saved"))
    }
}

fn conversation() -> Vec<ProviderMessage> {
    vec![
        ProviderMessage::user("My sister Ana lands Friday at 6pm."),
        ProviderMessage::assistant("Noted, I'll remind you Friday afternoon."),
    ]
}

#[tokio::test]
async fn sentinel_reply_means_nothing_saved() {
    let provider = MockProvider::with_texts(&[NO_REPLY]);
    let saved = run_memory_flush(&provider, "mock-model", &ToolRegistry::new(), &conversation(), 512)
        .await
        .unwrap();
    assert!(!saved);

    let request = &provider.requests().await[0];
    assert_eq!(request.max_tokens, 512);
    assert!(request.system_prompt.as_deref().unwrap().contains("memory keeper"));
    assert_eq!(request.messages.len(), 3);
    assert!(request.messages[2].text().contains(NO_REPLY));
}

#[tokio::test]
async fn tool_write_then_reply_counts_as_saved() {
    let write = Arc::new(RecordingWrite::default());
    let mut tools = ToolRegistry::new();
    tools.register(write.clone());

    let provider = MockProvider::with_responses(vec![
        tool_response(
            "memory_write",
            json!({"path": "MEMORY.md", "content": "## People\nSister: Ana\n"}),
        ),
        text_response("Saved Ana's arrival."),
    ]);

    let saved = run_memory_flush(&provider, "mock-model", &tools, &conversation(), 512)
        .await
        .unwrap();
    assert!(saved);
    assert_eq!(write.writes.lock().unwrap().as_slice(), ["## People\nSister: Ana\n"]);
}

#[tokio::test]
async fn flush_stops_after_five_steps() {
    let provider = MockProvider::new();
    for _ in 0..8 {
        provider.push(tool_response("memory_write", json!({}))).await;
    }
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(RecordingWrite::default()));

    run_memory_flush(&provider, "mock-model", &tools, &conversation(), 512)
        .await
        .unwrap();
    assert_eq!(provider.call_count().await, 5);
}

#[tokio::test]
async fn provider_failure_is_returned() {
    let provider = MockProvider::new();
    provider.push_error("rate limited").await;
    let result = run_memory_flush(&provider, "m", &ToolRegistry::new(), &conversation(), 512).await;
    assert!(result.is_err());
}
