// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tools the model can call during a run, and the loop that calls them.

pub mod memory;
pub mod runner;
pub mod schedule;
pub mod tool;

pub use memory::{MEMORY_WRITE_TOOL, MemoryGetTool, MemorySearchTool, MemoryWriteTool, register_memory_tools};
pub use runner::{LoopOutcome, run_tool_loop};
pub use schedule::{SCHEDULE_TOOL_NAMES, register_schedule_tools};
pub use tool::{Tool, ToolOutput, ToolRegistry};
