// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory scheduler with manual firing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mnemo_core::MnemoError;
use mnemo_core::traits::{JobHandler, Scheduler};
use mnemo_core::types::{NewJob, ScheduledJob};

/// A scheduler that never fires on its own; tests call [`fire`](Self::fire).
#[derive(Default)]
pub struct InMemoryScheduler {
    jobs: Mutex<Vec<ScheduledJob>>,
    handler: Mutex<Option<Arc<dyn JobHandler>>>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_handler(&self) -> bool {
        self.handler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Fires job `id` through the installed handler, returning its output.
    ///
    /// Returns `None` for unknown or disabled jobs, or when no handler is set.
    pub async fn fire(&self, id: &str) -> Option<String> {
        let job = self
            .jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .find(|j| j.id == id && j.enabled)
            .cloned()?;
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()?;
        Some(handler.on_job_fired(job).await)
    }
}

#[async_trait]
impl Scheduler for InMemoryScheduler {
    async fn add_job(&self, job: NewJob) -> Result<ScheduledJob, MnemoError> {
        if job.schedule.trim().is_empty() {
            return Err(MnemoError::Scheduler("schedule must not be empty".into()));
        }
        let scheduled = ScheduledJob {
            id: uuid::Uuid::new_v4().to_string(),
            name: job.name,
            schedule: job.schedule,
            prompt: job.prompt,
            enabled: true,
        };
        self.jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(scheduled.clone());
        Ok(scheduled)
    }

    async fn remove_job(&self, id: &str) -> Result<bool, MnemoError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        Ok(jobs.len() != before)
    }

    async fn toggle_job(&self, id: &str, enabled: bool) -> Result<bool, MnemoError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match jobs.iter_mut().find(|j| j.id == id) {
            Some(job) => {
                job.enabled = enabled;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_jobs(&self) -> Result<Vec<ScheduledJob>, MnemoError> {
        Ok(self
            .jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn set_handler(&self, handler: Arc<dyn JobHandler>) {
        *self.handler.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl JobHandler for Echo {
        async fn on_job_fired(&self, job: ScheduledJob) -> String {
            format!("ran {}", job.name)
        }
    }

    fn new_job(name: &str) -> NewJob {
        NewJob {
            name: name.to_string(),
            schedule: "0 9 * * *".to_string(),
            prompt: "check the weather".to_string(),
        }
    }

    #[tokio::test]
    async fn add_toggle_remove() {
        let scheduler = InMemoryScheduler::new();
        let job = scheduler.add_job(new_job("weather")).await.unwrap();
        assert!(job.enabled);
        assert_eq!(scheduler.list_jobs().await.unwrap().len(), 1);

        assert!(scheduler.toggle_job(&job.id, false).await.unwrap());
        assert!(!scheduler.list_jobs().await.unwrap()[0].enabled);
        assert!(!scheduler.toggle_job("missing", true).await.unwrap());

        assert!(scheduler.remove_job(&job.id).await.unwrap());
        assert!(!scheduler.remove_job(&job.id).await.unwrap());
    }

    #[tokio::test]
    async fn fire_uses_handler_and_skips_disabled() {
        let scheduler = InMemoryScheduler::new();
        let job = scheduler.add_job(new_job("weather")).await.unwrap();
        assert_eq!(scheduler.fire(&job.id).await, None);

        scheduler.set_handler(Arc::new(Echo));
        assert_eq!(scheduler.fire(&job.id).await.as_deref(), Some("ran weather"));

        scheduler.toggle_job(&job.id, false).await.unwrap();
        assert_eq!(scheduler.fire(&job.id).await, None);
    }
}
