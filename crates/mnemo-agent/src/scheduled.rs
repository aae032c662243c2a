// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Weak;

use async_trait::async_trait;
use mnemo_core::traits::JobHandler;
use mnemo_core::types::ScheduledJob;
use tracing::warn;

use crate::agent::Agent;

/// Runs fired jobs through the agent. Weak so the scheduler does not keep
/// the agent alive.
pub(crate) struct AgentJobHandler {
    agent: Weak<Agent>,
}

impl AgentJobHandler {
    pub(crate) fn new(agent: Weak<Agent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl JobHandler for AgentJobHandler {
    async fn on_job_fired(&self, job: ScheduledJob) -> String {
        match self.agent.upgrade() {
            Some(agent) => agent.run_scheduled(&job).await,
            None => {
                warn!(job = %job.name, "job fired after the agent shut down");
                "Error: agent is no longer running".to_string()
            }
        }
    }
}
