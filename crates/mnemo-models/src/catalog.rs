// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model catalogue entries and the built-in default catalogue.

use mnemo_config::model::{ModelEntry, ModelsConfig};
use mnemo_core::types::{ModelTier, ProviderKind};
use serde::Serialize;
use tracing::debug;

/// Context window assumed for custom models and entries that omit one.
pub const DEFAULT_CONTEXT_WINDOW: u32 = 128_000;

/// One model the registry can select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSpec {
    /// Provider-side model identifier.
    pub id: String,
    /// Short display name, also accepted by lookups.
    pub label: String,
    pub provider: ProviderKind,
    pub tier: ModelTier,
    /// Supports tool calling.
    pub tool_use: bool,
    /// Accepts image input.
    pub vision: bool,
    /// Context window in tokens.
    pub context_window: u32,
    /// Not in the catalogue; accepted verbatim from a user-supplied id.
    pub custom: bool,
}

impl ModelSpec {
    fn builtin(
        id: &str,
        label: &str,
        provider: ProviderKind,
        tier: ModelTier,
        vision: bool,
        context_window: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            provider,
            tier,
            tool_use: true,
            vision,
            context_window,
            custom: false,
        }
    }

    fn without_tools(mut self) -> Self {
        self.tool_use = false;
        self
    }

    /// Whether `name` refers to this entry (id or label, case-insensitive).
    pub fn matches(&self, name: &str) -> bool {
        self.id.eq_ignore_ascii_case(name) || self.label.eq_ignore_ascii_case(name)
    }
}

impl From<&ModelEntry> for ModelSpec {
    fn from(entry: &ModelEntry) -> Self {
        Self {
            id: entry.id.clone(),
            label: entry.label.clone().unwrap_or_else(|| entry.id.clone()),
            provider: entry.provider,
            tier: entry.tier,
            tool_use: entry.tool_use,
            vision: entry.vision,
            context_window: entry.context_window.unwrap_or(DEFAULT_CONTEXT_WINDOW),
            custom: false,
        }
    }
}

/// The built-in catalogue: three tiers for each supported provider.
pub fn default_catalog() -> Vec<ModelSpec> {
    use ModelTier::{Fast, Pro, Smart};
    use ProviderKind::{Anthropic, Google, OpenAi};

    vec![
        ModelSpec::builtin("claude-haiku-4-5-20251001", "Claude Haiku 4.5", Anthropic, Fast, true, 200_000),
        ModelSpec::builtin("claude-sonnet-4-5-20250929", "Claude Sonnet 4.5", Anthropic, Smart, true, 200_000),
        ModelSpec::builtin("claude-opus-4-1-20250805", "Claude Opus 4.1", Anthropic, Pro, true, 200_000),
        ModelSpec::builtin("gpt-4o-mini", "GPT-4o mini", OpenAi, Fast, true, 128_000),
        ModelSpec::builtin("gpt-4.1", "GPT-4.1", OpenAi, Smart, true, 1_047_576),
        ModelSpec::builtin("o3", "o3", OpenAi, Pro, true, 200_000),
        ModelSpec::builtin("gemini-2.0-flash-lite", "Gemini 2.0 Flash-Lite", Google, Fast, true, 1_048_576)
            .without_tools(),
        ModelSpec::builtin("gemini-2.5-flash", "Gemini 2.5 Flash", Google, Smart, true, 1_048_576),
        ModelSpec::builtin("gemini-2.5-pro", "Gemini 2.5 Pro", Google, Pro, true, 1_048_576),
    ]
}

/// Builds the catalogue from `[models]` configuration.
///
/// Configured entries replace built-in entries with the same id and are
/// otherwise appended; with `replace_defaults` they are the whole catalogue.
pub fn catalog_from_config(config: &ModelsConfig) -> Vec<ModelSpec> {
    let mut catalog = if config.replace_defaults {
        Vec::new()
    } else {
        default_catalog()
    };

    for entry in &config.catalog {
        let spec = ModelSpec::from(entry);
        match catalog.iter_mut().find(|m| m.id.eq_ignore_ascii_case(&spec.id)) {
            Some(existing) => *existing = spec,
            None => catalog.push(spec),
        }
    }

    debug!(models = catalog.len(), "model catalogue built");
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, tier: ModelTier) -> ModelEntry {
        ModelEntry {
            id: id.to_string(),
            label: None,
            provider: ProviderKind::OpenAi,
            tier,
            tool_use: true,
            vision: false,
            context_window: None,
        }
    }

    #[test]
    fn default_catalog_covers_every_provider_and_tier() {
        let catalog = default_catalog();
        for provider in [ProviderKind::Anthropic, ProviderKind::OpenAi, ProviderKind::Google] {
            for tier in [ModelTier::Fast, ModelTier::Smart, ModelTier::Pro] {
                assert!(
                    catalog.iter().any(|m| m.provider == provider && m.tier == tier),
                    "missing {provider} {tier}"
                );
            }
        }
        assert!(catalog.iter().all(|m| !m.custom));
    }

    #[test]
    fn flash_lite_has_no_tools() {
        let catalog = default_catalog();
        let lite = catalog.iter().find(|m| m.id == "gemini-2.0-flash-lite").unwrap();
        assert!(!lite.tool_use);
    }

    #[test]
    fn matches_id_or_label_ignoring_case() {
        let catalog = default_catalog();
        let sonnet = catalog.iter().find(|m| m.tier == ModelTier::Smart).unwrap();
        assert!(sonnet.matches("CLAUDE-SONNET-4-5-20250929"));
        assert!(sonnet.matches("claude sonnet 4.5"));
        assert!(!sonnet.matches("sonnet"));
    }

    #[test]
    fn config_entries_extend_defaults() {
        let config = ModelsConfig {
            replace_defaults: false,
            catalog: vec![entry("my-local-llm", ModelTier::Fast)],
        };
        let catalog = catalog_from_config(&config);
        assert_eq!(catalog.len(), default_catalog().len() + 1);
        let local = catalog.last().unwrap();
        assert_eq!(local.label, "my-local-llm");
        assert_eq!(local.context_window, DEFAULT_CONTEXT_WINDOW);
    }

    #[test]
    fn config_entries_override_same_id() {
        let mut override_entry = entry("GPT-4.1", ModelTier::Pro);
        override_entry.context_window = Some(64_000);
        let config = ModelsConfig {
            replace_defaults: false,
            catalog: vec![override_entry],
        };
        let catalog = catalog_from_config(&config);
        assert_eq!(catalog.len(), default_catalog().len());
        let gpt = catalog.iter().find(|m| m.matches("gpt-4.1")).unwrap();
        assert_eq!(gpt.tier, ModelTier::Pro);
        assert_eq!(gpt.context_window, 64_000);
    }

    #[test]
    fn replace_defaults_keeps_only_config() {
        let config = ModelsConfig {
            replace_defaults: true,
            catalog: vec![entry("only-model", ModelTier::Smart)],
        };
        let catalog = catalog_from_config(&config);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].id, "only-model");
    }
}
