// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Personality (soul) and skill text providers.
//!
//! Both are opaque to the agent: it only asks them for prompt text.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mnemo_core::MnemoError;
use tracing::{info, warn};

/// File name of the personality document inside the memory root.
pub const SOUL_FILE: &str = "SOUL.md";

const DEFAULT_SOUL: &str = "# Soul\n\n\
## Identity\n\
A calm, curious personal assistant.\n\n\
## Voice\n\
Warm and brief. Plain words over jargon. Asks one question at a time.\n\n\
## Boundaries\n\
Never invents facts about the user; checks memory first and says so when unsure.\n";

const ONBOARDING_PROMPT: &str = "# Onboarding\n\n\
This is your first conversation with this user. Introduce yourself briefly, \
then get to know them over the next few messages: their name, how they would \
like to be addressed, where they are, and what they want help with. Save what \
you learn to MEMORY.md under a \"## User Profile\" heading with memory_write. \
Do not ask everything at once.";

/// Personality document provider.
#[async_trait]
pub trait SoulSource: Send + Sync {
    /// The raw document, or `None` if there is none yet.
    async fn read(&self) -> Option<String>;

    /// Prompt section for the personality, empty when there is none.
    async fn build_context(&self) -> String {
        match self.read().await {
            Some(soul) => soul.trim().to_string(),
            None => String::new(),
        }
    }

    /// Prompt section injected on a first run.
    fn build_onboarding_prompt(&self) -> String {
        ONBOARDING_PROMPT.to_string()
    }

    async fn exists(&self) -> bool;

    /// Writes a starter document if none exists.
    async fn create_default(&self) -> Result<(), MnemoError>;
}

/// Skill text provider.
#[async_trait]
pub trait SkillSource: Send + Sync {
    /// (Re)loads every skill. Returns how many are available.
    async fn load_all(&self) -> Result<usize, MnemoError>;

    /// Prompt section describing the loaded skills, empty when there are none.
    async fn build_context(&self) -> String;
}

/// `SOUL.md` on disk.
#[derive(Debug, Clone)]
pub struct FileSoul {
    path: PathBuf,
}

impl FileSoul {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `SOUL.md` inside `root`.
    pub fn in_root(root: &Path) -> Self {
        Self::new(root.join(SOUL_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SoulSource for FileSoul {
    async fn read(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if !content.trim().is_empty() => Some(content),
            Ok(_) => None,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read soul file");
                None
            }
        }
    }

    async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    async fn create_default(&self) -> Result<(), MnemoError> {
        if self.exists().await {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, DEFAULT_SOUL).await?;
        info!(path = %self.path.display(), "default soul file created");
        Ok(())
    }
}

/// No skills.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSkills;

#[async_trait]
impl SkillSource for NoSkills {
    async fn load_all(&self) -> Result<usize, MnemoError> {
        Ok(0)
    }

    async fn build_context(&self) -> String {
        String::new()
    }
}
