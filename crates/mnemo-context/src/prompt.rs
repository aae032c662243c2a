// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt assembly.

use mnemo_config::model::AgentConfig;

/// Base behavior prompt when `agent.system_prompt` is unset. `{name}` is
/// replaced with the agent's name.
const DEFAULT_BASE_PROMPT: &str = "You are {name}, a personal assistant with a long-term memory.

Memory is plain Markdown: MEMORY.md holds durable facts about the user, and \
daily/YYYY-MM-DD.md holds what happened each day. The most relevant parts are \
included below. Before answering questions about the user's past, preferences \
or plans, use memory_search and memory_get. When you learn something durable, \
save it to MEMORY.md with memory_write under a fitting ## heading.

Be concise. Never invent memories.";

/// The pieces a system prompt is built from, in prompt order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptParts {
    pub base: String,
    pub soul: String,
    /// Present only on a first run.
    pub onboarding: Option<String>,
    pub memory: String,
    pub skills: String,
}

/// The base behavior prompt for `config`.
pub fn base_prompt(config: &AgentConfig) -> String {
    match config.system_prompt.as_deref().map(str::trim) {
        Some(prompt) if !prompt.is_empty() => prompt.to_string(),
        _ => DEFAULT_BASE_PROMPT.replace("{name}", &config.name),
    }
}

/// Joins the non-empty parts with blank lines.
pub fn build_system_prompt(parts: &PromptParts) -> String {
    let memory = if parts.memory.trim().is_empty() {
        String::new()
    } else {
        format!("# Memory\n\n{}", parts.memory.trim())
    };

    [
        parts.base.trim(),
        parts.soul.trim(),
        parts.onboarding.as_deref().unwrap_or("").trim(),
        memory.as_str(),
        parts.skills.trim(),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_uses_agent_name() {
        let config = AgentConfig {
            name: "Iris".into(),
            ..AgentConfig::default()
        };
        assert!(base_prompt(&config).starts_with("You are Iris,"));
    }

    #[test]
    fn configured_base_wins() {
        let config = AgentConfig {
            system_prompt: Some("Answer in haiku.".into()),
            ..AgentConfig::default()
        };
        assert_eq!(base_prompt(&config), "Answer in haiku.");

        let blank = AgentConfig {
            system_prompt: Some("   ".into()),
            ..AgentConfig::default()
        };
        assert!(base_prompt(&blank).starts_with("You are mnemo,"));
    }

    #[test]
    fn parts_appear_in_order() {
        let prompt = build_system_prompt(&PromptParts {
            base: "BASE".into(),
            soul: "SOUL".into(),
            onboarding: Some("ONBOARD".into()),
            memory: "# Long-term Memory\n\nfacts".into(),
            skills: "SKILLS".into(),
        });
        assert_eq!(
            prompt,
            "BASE\n\nSOUL\n\nONBOARD\n\n# Memory\n\n# Long-term Memory\n\nfacts\n\nSKILLS"
        );
    }

    #[test]
    fn empty_parts_are_skipped() {
        let prompt = build_system_prompt(&PromptParts {
            base: "BASE".into(),
            memory: "  \n".into(),
            ..PromptParts::default()
        });
        assert_eq!(prompt, "BASE");
    }
}
