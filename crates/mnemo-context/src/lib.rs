// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context management for Mnemo: the memory flush controller and
//! system-prompt assembly from base behavior, personality, onboarding,
//! memory and skills.

pub mod flush;
pub mod prompt;
pub mod sources;

pub use flush::{
    DEFAULT_FLUSH_THRESHOLD, FLUSH_MAX_STEPS, FlushSettings, NO_REPLY, estimate_tokens,
    run_memory_flush, should_flush,
};
pub use prompt::{PromptParts, base_prompt, build_system_prompt};
pub use sources::{FileSoul, NoSkills, SOUL_FILE, SkillSource, SoulSource};
