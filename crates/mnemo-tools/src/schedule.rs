// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduling tools over an injected [`Scheduler`].

use std::sync::Arc;

use async_trait::async_trait;
use mnemo_core::MnemoError;
use mnemo_core::traits::Scheduler;
use mnemo_core::types::NewJob;
use serde_json::json;

use crate::tool::{Tool, ToolOutput, ToolRegistry, required_str};

/// Names of every scheduling tool. Withheld from runs started by a fired job.
pub const SCHEDULE_TOOL_NAMES: [&str; 4] = [
    "schedule_add",
    "schedule_list",
    "schedule_remove",
    "schedule_toggle",
];

pub fn register_schedule_tools(registry: &mut ToolRegistry, scheduler: Arc<dyn Scheduler>) {
    for kind in [Kind::Add, Kind::List, Kind::Remove, Kind::Toggle] {
        registry.register(Arc::new(ScheduleTool {
            kind,
            scheduler: scheduler.clone(),
        }));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Add,
    List,
    Remove,
    Toggle,
}

/// One scheduling operation exposed as a tool.
struct ScheduleTool {
    kind: Kind,
    scheduler: Arc<dyn Scheduler>,
}

#[async_trait]
impl Tool for ScheduleTool {
    fn name(&self) -> &str {
        match self.kind {
            Kind::Add => SCHEDULE_TOOL_NAMES[0],
            Kind::List => SCHEDULE_TOOL_NAMES[1],
            Kind::Remove => SCHEDULE_TOOL_NAMES[2],
            Kind::Toggle => SCHEDULE_TOOL_NAMES[3],
        }
    }

    fn description(&self) -> &str {
        match self.kind {
            Kind::Add => "Schedule a recurring task. The prompt runs as a new request each time the cron schedule fires.",
            Kind::List => "List scheduled tasks with their ids, schedules and enabled state.",
            Kind::Remove => "Delete a scheduled task by id.",
            Kind::Toggle => "Enable or disable a scheduled task by id.",
        }
    }

    fn parameters_schema(&self) -> serde_json::Value {
        match self.kind {
            Kind::Add => json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Short label" },
                    "schedule": { "type": "string", "description": "Cron expression, e.g. \"0 9 * * 1-5\"" },
                    "prompt": { "type": "string", "description": "What to do when the task fires" }
                },
                "required": ["name", "schedule", "prompt"]
            }),
            Kind::List => json!({ "type": "object", "properties": {} }),
            Kind::Remove => json!({
                "type": "object",
                "properties": { "id": { "type": "string" } },
                "required": ["id"]
            }),
            Kind::Toggle => json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string" },
                    "enabled": { "type": "boolean" }
                },
                "required": ["id", "enabled"]
            }),
        }
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, MnemoError> {
        let name = self.name();
        match self.kind {
            Kind::Add => {
                let job = NewJob {
                    name: required_str(&input, name, "name")?.to_string(),
                    schedule: required_str(&input, name, "schedule")?.to_string(),
                    prompt: required_str(&input, name, "prompt")?.to_string(),
                };
                let job = self.scheduler.add_job(job).await?;
                Ok(ToolOutput::ok(format!(
                    "Scheduled \"{}\" ({}) with id {}",
                    job.name, job.schedule, job.id
                )))
            }
            Kind::List => {
                let jobs = self.scheduler.list_jobs().await?;
                if jobs.is_empty() {
                    return Ok(ToolOutput::ok("No scheduled tasks."));
                }
                let body = serde_json::to_string_pretty(&jobs)
                    .map_err(|e| MnemoError::Internal(format!("{name}: {e}")))?;
                Ok(ToolOutput::ok(body))
            }
            Kind::Remove => {
                let id = required_str(&input, name, "id")?;
                Ok(found(self.scheduler.remove_job(id).await?, id, "Removed"))
            }
            Kind::Toggle => {
                let id = required_str(&input, name, "id")?;
                let enabled = input["enabled"]
                    .as_bool()
                    .ok_or_else(|| MnemoError::Internal(format!("{name}: missing 'enabled' field")))?;
                let verb = if enabled { "Enabled" } else { "Disabled" };
                Ok(found(self.scheduler.toggle_job(id, enabled).await?, id, verb))
            }
        }
    }
}

fn found(hit: bool, id: &str, verb: &str) -> ToolOutput {
    if hit {
        ToolOutput::ok(format!("{verb} task {id}"))
    } else {
        ToolOutput::error(format!("No task with id {id}"))
    }
}
