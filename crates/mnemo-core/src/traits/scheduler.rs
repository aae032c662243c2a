// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contract for an external job scheduler the agent can be attached to.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::MnemoError;
use crate::types::{NewJob, ScheduledJob};

/// Receives jobs when the scheduler fires them.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Handles a fired job and returns the text produced for it.
    async fn on_job_fired(&self, job: ScheduledJob) -> String;
}

/// A cron-style scheduler owned outside the assistant core.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Registers a job and returns it with its assigned id.
    async fn add_job(&self, job: NewJob) -> Result<ScheduledJob, MnemoError>;

    /// Removes a job. Returns `false` if no job had that id.
    async fn remove_job(&self, id: &str) -> Result<bool, MnemoError>;

    /// Enables or disables a job. Returns `false` if no job had that id.
    async fn toggle_job(&self, id: &str, enabled: bool) -> Result<bool, MnemoError>;

    /// Lists all registered jobs.
    async fn list_jobs(&self) -> Result<Vec<ScheduledJob>, MnemoError>;

    /// Installs the handler invoked when a job fires, replacing any previous one.
    fn set_handler(&self, handler: Arc<dyn JobHandler>);
}
