// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with a script of responses
//! (text, tool calls or errors) and records every request it receives.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mnemo_core::MnemoError;
use mnemo_core::traits::{PluginAdapter, ProviderAdapter};
use mnemo_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage, ToolUseData,
};

/// One scripted provider turn.
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(ProviderResponse),
    Fail(String),
}

/// A text-only response.
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        id: format!("mock-resp-{}", uuid::Uuid::new_v4()),
        content: text.to_string(),
        model: String::new(),
        stop_reason: Some("end_turn".to_string()),
        usage: TokenUsage {
            input_tokens: 10,
            output_tokens: 20,
        },
        tool_uses: Vec::new(),
    }
}

/// A response that calls one tool.
pub fn tool_response(name: &str, input: serde_json::Value) -> ProviderResponse {
    ProviderResponse {
        stop_reason: Some("tool_use".to_string()),
        tool_uses: vec![ToolUseData {
            id: format!("toolu_{}", uuid::Uuid::new_v4().simple()),
            name: name.to_string(),
            input,
        }],
        ..text_response("")
    }
}

/// A mock LLM provider that plays back a script.
///
/// Entries are popped from a FIFO queue. When the queue is empty, a default
/// "mock response" text is returned.
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<ProviderResponse>) -> Self {
        Self {
            script: Arc::new(Mutex::new(
                responses.into_iter().map(Scripted::Respond).collect(),
            )),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider that answers each call with the next text.
    pub fn with_texts(texts: &[&str]) -> Self {
        Self::with_responses(texts.iter().map(|t| text_response(t)).collect())
    }

    /// Add a response to the end of the script.
    pub async fn push(&self, response: ProviderResponse) {
        self.script.lock().await.push_back(Scripted::Respond(response));
    }

    /// Make the next unanswered call fail with a provider error.
    pub async fn push_error(&self, message: &str) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Fail(message.to_string()));
    }

    /// Every request received so far, in order.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of calls received so far.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    async fn next_response(&self) -> Scripted {
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Scripted::Respond(text_response("mock response")))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, MnemoError> {
        let model = request.model.clone();
        self.requests.lock().await.push(request);
        match self.next_response().await {
            Scripted::Respond(mut response) => {
                response.model = model;
                Ok(response)
            }
            Scripted::Fail(message) => Err(MnemoError::Provider {
                message,
                source: None,
            }),
        }
    }
}
