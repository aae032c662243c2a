// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-call run state.

use serde::Serialize;

/// Usage and timing of one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Label of the model that answered.
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub duration_ms: u64,
}

/// Observer called with each tool name as the model's tool calls complete.
pub type ToolUseObserver = Box<dyn FnMut(&str) + Send>;

/// State threaded through one [`Agent::run_with_context`](crate::Agent::run_with_context)
/// call, so concurrent runs never share an observer or a stats slot.
#[derive(Default)]
pub struct RunContext {
    pub on_tool_use: Option<ToolUseObserver>,
    /// Filled in when the run reaches the model and completes.
    pub stats: Option<RunStats>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(on_tool_use: impl FnMut(&str) + Send + 'static) -> Self {
        Self {
            on_tool_use: Some(Box::new(on_tool_use)),
            stats: None,
        }
    }

    pub(crate) fn observe(&mut self, tool: &str) {
        if let Some(callback) = self.on_tool_use.as_mut() {
            callback(tool);
        }
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("on_tool_use", &self.on_tool_use.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}
