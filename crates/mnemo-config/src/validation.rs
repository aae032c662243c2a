// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express:
//! weight ranges, chunk geometry, flush threshold bounds, catalogue ids.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{EmbeddingProviderKind, MnemoConfig};

/// Characters per line assumed when converting chunk sizes to line counts.
const CHARS_PER_LINE: usize = 80;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of failing fast.
pub fn validate_config(config: &MnemoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.agent.max_tokens == 0 {
        fail("agent.max_tokens must be greater than 0".to_string());
    }

    if let Some(model) = &config.agent.model
        && model.trim().is_empty()
    {
        fail("agent.model must not be empty when set".to_string());
    }

    let memory = &config.memory;
    if memory.root_dir.trim().is_empty() {
        fail("memory.root_dir must not be empty".to_string());
    }

    for (name, weight) in [
        ("memory.vector_weight", memory.vector_weight),
        ("memory.keyword_weight", memory.keyword_weight),
    ] {
        if !weight.is_finite() || weight < 0.0 {
            fail(format!("{name} must be a non-negative number, got {weight}"));
        }
    }

    if memory.vector_weight == 0.0 && memory.keyword_weight == 0.0 {
        fail("memory.vector_weight and memory.keyword_weight cannot both be 0".to_string());
    }

    if !memory.min_score.is_finite() || memory.min_score < 0.0 {
        fail(format!(
            "memory.min_score must be a non-negative number, got {}",
            memory.min_score
        ));
    }

    if memory.max_results == 0 {
        fail("memory.max_results must be at least 1".to_string());
    }

    if memory.chunk_size < CHARS_PER_LINE {
        fail(format!(
            "memory.chunk_size must be at least {CHARS_PER_LINE} (one line), got {}",
            memory.chunk_size
        ));
    }

    if memory.chunk_overlap >= memory.chunk_size {
        fail(format!(
            "memory.chunk_overlap ({}) must be smaller than memory.chunk_size ({})",
            memory.chunk_overlap, memory.chunk_size
        ));
    }

    let embedding = &memory.embedding;
    if embedding.provider != EmbeddingProviderKind::None {
        if embedding.concurrency == 0 {
            fail("memory.embedding.concurrency must be at least 1".to_string());
        }
        if let Some(url) = &embedding.base_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            fail(format!(
                "memory.embedding.base_url `{url}` must start with http:// or https://"
            ));
        }
        if embedding.dimensions == Some(0) {
            fail("memory.embedding.dimensions must be greater than 0 when set".to_string());
        }
    }

    let threshold = config.context.flush_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        fail(format!(
            "context.flush_threshold must be in (0, 1], got {threshold}"
        ));
    }

    if config.context.default_context_window == 0 {
        fail("context.default_context_window must be greater than 0".to_string());
    }

    let mut seen_ids = HashSet::new();
    for (i, entry) in config.models.catalog.iter().enumerate() {
        if entry.id.trim().is_empty() {
            fail(format!("models.catalog[{i}].id must not be empty"));
        } else if !seen_ids.insert(entry.id.to_lowercase()) {
            fail(format!("duplicate model id `{}` in models.catalog", entry.id));
        }
        if entry.context_window == Some(0) {
            fail(format!(
                "models.catalog[{i}].context_window must be greater than 0 when set"
            ));
        }
    }

    if config.models.replace_defaults && config.models.catalog.is_empty() {
        fail("models.replace_defaults is set but models.catalog is empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelEntry;
    use mnemo_core::types::{ModelTier, ProviderKind};

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&MnemoConfig::default()).is_ok());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut config = MnemoConfig::default();
        config.memory.chunk_size = 800;
        config.memory.chunk_overlap = 800;
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors)[0].contains("chunk_overlap"));
    }

    #[test]
    fn flush_threshold_out_of_range_fails() {
        let mut config = MnemoConfig::default();
        config.context.flush_threshold = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(messages(&errors)[0].contains("flush_threshold"));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = MnemoConfig::default();
        config.memory.max_results = 0;
        config.memory.vector_weight = -1.0;
        config.agent.max_tokens = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn duplicate_catalog_ids_fail() {
        let entry = ModelEntry {
            id: "local-llama".into(),
            label: None,
            provider: ProviderKind::OpenAi,
            tier: ModelTier::Fast,
            tool_use: true,
            vision: false,
            context_window: None,
        };
        let mut config = MnemoConfig::default();
        config.models.catalog = vec![entry.clone(), entry];
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors)[0].contains("duplicate model id"));
    }

    #[test]
    fn embedding_url_checked_only_when_enabled() {
        let mut config = MnemoConfig::default();
        config.memory.embedding.base_url = Some("localhost:11434".into());
        assert!(validate_config(&config).is_ok());

        config.memory.embedding.provider = EmbeddingProviderKind::Ollama;
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors)[0].contains("base_url"));
    }
}
