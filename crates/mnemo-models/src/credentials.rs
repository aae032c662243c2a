// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider credential detection.

use std::collections::HashMap;

use mnemo_config::model::ProvidersConfig;
use mnemo_core::types::ProviderKind;

/// Provider order used whenever "the first available provider" is needed.
pub const PROVIDER_ORDER: [ProviderKind; 3] = [
    ProviderKind::Anthropic,
    ProviderKind::OpenAi,
    ProviderKind::Google,
];

/// API keys found for each provider.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    keys: HashMap<ProviderKind, String>,
}

impl Credentials {
    /// Detects credentials from configuration, then the process environment.
    pub fn detect(config: &ProvidersConfig) -> Self {
        Self::detect_with(config, |name| std::env::var(name).ok())
    }

    /// Like [`detect`](Self::detect) with an injectable environment lookup.
    ///
    /// Config keys win over environment variables. Blank values never count.
    pub fn detect_with(config: &ProvidersConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let from_env = |names: &[&str]| names.iter().find_map(|name| non_blank(env(name)));

        let mut keys = HashMap::new();
        let candidates = [
            (
                ProviderKind::Anthropic,
                non_blank(config.anthropic_api_key.clone()).or_else(|| from_env(&["ANTHROPIC_API_KEY"])),
            ),
            (
                ProviderKind::OpenAi,
                non_blank(config.openai_api_key.clone()).or_else(|| from_env(&["OPENAI_API_KEY"])),
            ),
            (
                ProviderKind::Google,
                non_blank(config.google_api_key.clone())
                    .or_else(|| from_env(&["GEMINI_API_KEY", "GOOGLE_API_KEY"])),
            ),
        ];
        for (provider, key) in candidates {
            if let Some(key) = key {
                keys.insert(provider, key);
            }
        }
        Self { keys }
    }

    /// Builds credentials from explicit `(provider, key)` pairs.
    pub fn from_keys(keys: impl IntoIterator<Item = (ProviderKind, String)>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .filter_map(|(provider, key)| non_blank(Some(key)).map(|k| (provider, k)))
                .collect(),
        }
    }

    pub fn has(&self, provider: ProviderKind) -> bool {
        self.keys.contains_key(&provider)
    }

    pub fn key(&self, provider: ProviderKind) -> Option<&str> {
        self.keys.get(&provider).map(String::as_str)
    }

    /// Providers with a key, in [`PROVIDER_ORDER`].
    pub fn providers(&self) -> Vec<ProviderKind> {
        PROVIDER_ORDER.into_iter().filter(|p| self.has(*p)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
