// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory read/write tools over a [`MemoryStore`].

use std::sync::Arc;

use async_trait::async_trait;
use mnemo_core::MnemoError;
use mnemo_memory::MemoryStore;
use serde_json::json;

use crate::tool::{Tool, ToolOutput, ToolRegistry, required_str};

/// Name of the tool the flush turn asks the model to save facts with.
pub const MEMORY_WRITE_TOOL: &str = "memory_write";

const DEFAULT_GET_LINES: usize = 40;

/// Registers `memory_search`, `memory_get` and `memory_write`.
pub fn register_memory_tools(registry: &mut ToolRegistry, store: Arc<MemoryStore>) {
    registry.register(Arc::new(MemorySearchTool::new(store.clone())));
    registry.register(Arc::new(MemoryGetTool::new(store.clone())));
    registry.register(Arc::new(MemoryWriteTool::new(store)));
}

/// Hybrid search over the memory corpus.
pub struct MemorySearchTool {
    store: Arc<MemoryStore>,
}

impl MemorySearchTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for MemorySearchTool {
    fn name(&self) -> &str {
        "memory_search"
    }

    fn description(&self) -> &str {
        "Search long-term memory and daily logs. Returns ranked hits with path, line range, score and a snippet; use memory_get to read more around a hit."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Words or phrase to look for" }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MnemoError> {
        let query = required_str(&input, self.name(), "query")?;
        let results = self.store.search(query).await;
        if results.is_empty() {
            return Ok(ToolOutput::ok("No matching memories."));
        }
        let body = serde_json::to_string_pretty(&results)
            .map_err(|e| MnemoError::Internal(format!("memory_search: {e}")))?;
        Ok(ToolOutput::ok(body))
    }
}

/// Literal line slice of one corpus file.
pub struct MemoryGetTool {
    store: Arc<MemoryStore>,
}

impl MemoryGetTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for MemoryGetTool {
    fn name(&self) -> &str {
        "memory_get"
    }

    fn description(&self) -> &str {
        "Read lines from a memory file, e.g. around a memory_search hit."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path relative to the memory root, e.g. MEMORY.md or daily/2025-01-01.md" },
                "from": { "type": "integer", "minimum": 1, "description": "First line, 1-based" },
                "lines": { "type": "integer", "minimum": 1, "description": "Number of lines to read" }
            },
            "required": ["path"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MnemoError> {
        let path = required_str(&input, self.name(), "path")?;
        let from = input["from"].as_u64().unwrap_or(1) as usize;
        let count = input["lines"].as_u64().map_or(DEFAULT_GET_LINES, |n| n as usize);

        let text = self.store.get_lines(path, from, count).await;
        if text.is_empty() {
            return Ok(ToolOutput::error(format!("No lines at {path}:{from}")));
        }
        Ok(ToolOutput::ok(text))
    }
}

/// Writes `MEMORY.md`, merged section by section.
pub struct MemoryWriteTool {
    store: Arc<MemoryStore>,
}

impl MemoryWriteTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for MemoryWriteTool {
    fn name(&self) -> &str {
        MEMORY_WRITE_TOOL
    }

    fn description(&self) -> &str {
        "Save durable facts to MEMORY.md. Only the sections (# / ## / ### headings) you include are replaced; all others are kept. Daily logs are append-only and cannot be written."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Must be MEMORY.md" },
                "content": { "type": "string", "description": "Markdown to write" }
            },
            "required": ["path", "content"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MnemoError> {
        let path = required_str(&input, self.name(), "path")?;
        let content = required_str(&input, self.name(), "content")?;

        match self.store.write_file(path, content).await {
            Ok(written) => Ok(ToolOutput::ok(format!(
                "Saved {path} ({} bytes)",
                written.len()
            ))),
            Err(MnemoError::Memory(msg)) => Ok(ToolOutput::error(msg)),
            Err(e) => Err(e),
        }
    }
}
