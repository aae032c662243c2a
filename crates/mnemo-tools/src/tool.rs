// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and registry.
//!
//! The [`ToolRegistry`] is handed to the model untouched: it renders every
//! registered tool as a `{name, description, input_schema}` definition and
//! resolves the names the model calls back to executors.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mnemo_core::MnemoError;
use serde::{Deserialize, Serialize};

/// Output from a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text fed back to the model.
    pub content: String,
    /// Whether the invocation failed.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// A capability the model may call during a run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name, used for lookup and in the model's tool definitions.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the tool's input object.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Runs the tool with the model-supplied input.
    ///
    /// An `Err` is reported to the model as an error result; it does not end
    /// the run.
    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MnemoError>;
}

/// Tools available to a run, indexed by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its `name()`, replacing any tool of that name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Removes a tool. Returns `true` if it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// A copy of this registry without the named tools.
    pub fn without(&self, names: &[&str]) -> Self {
        let tools = self
            .tools
            .iter()
            .filter(|(name, _)| !names.contains(&name.as_str()))
            .map(|(name, tool)| (name.clone(), tool.clone()))
            .collect();
        Self { tools }
    }

    /// Sorted tool names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Tool definitions for a provider request, sorted by name.
    pub fn tool_definitions(&self) -> Vec<serde_json::Value> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "input_schema": t.parameters_schema(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Reads a required string field from a tool input.
pub(crate) fn required_str<'a>(
    input: &'a serde_json::Value,
    tool: &str,
    field: &str,
) -> Result<&'a str, MnemoError> {
    input[field]
        .as_str()
        .ok_or_else(|| MnemoError::Internal(format!("{tool}: missing '{field}' field")))
}
