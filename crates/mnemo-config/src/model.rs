// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mnemo assistant core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use mnemo_core::types::{ModelTier, ProviderKind};
use serde::{Deserialize, Serialize};

/// Top-level Mnemo configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemoConfig {
    /// Agent identity and model preference.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Memory corpus, indexing, and search tuning.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Context-window management (memory flush).
    #[serde(default)]
    pub context: ContextConfig,

    /// Provider credentials. Environment variables fill in anything unset here.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Model catalogue overrides.
    #[serde(default)]
    pub models: ModelsConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Explicit model id or label. Wins over `tier` when set.
    #[serde(default)]
    pub model: Option<String>,

    /// Preferred quality tier when no explicit model is configured.
    #[serde(default = "default_tier")]
    pub tier: ModelTier,

    /// Maximum tokens to generate per model step.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Replaces the built-in base behavior prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            model: None,
            tier: default_tier(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
        }
    }
}

fn default_agent_name() -> String {
    "mnemo".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tier() -> ModelTier {
    ModelTier::Smart
}

fn default_max_tokens() -> u32 {
    4096
}

/// Memory corpus configuration.
///
/// Controls where the corpus lives, how much of it reaches the prompt, and
/// how hybrid search is tuned.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Root directory holding `MEMORY.md`, `daily/`, and `index.sqlite`.
    #[serde(default = "default_root_dir")]
    pub root_dir: String,

    /// Byte budget for the long-term file inside the prompt (tail is kept).
    #[serde(default = "default_memory_max_bytes")]
    pub memory_max_bytes: usize,

    /// Number of trailing `## ` entries of today's log injected into the prompt.
    #[serde(default = "default_daily_tail_entries")]
    pub daily_tail_entries: usize,

    /// Weight applied to normalized vector scores.
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f64,

    /// Weight applied to normalized keyword scores (1.0 when no vector hits).
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,

    /// Merged results scoring below this are dropped.
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// Maximum number of merged search results.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Chunk size in characters (converted to lines at 80 chars per line).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks, in characters.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Embedding provider for vector search.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            memory_max_bytes: default_memory_max_bytes(),
            daily_tail_entries: default_daily_tail_entries(),
            vector_weight: default_vector_weight(),
            keyword_weight: default_keyword_weight(),
            min_score: default_min_score(),
            max_results: default_max_results(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

fn default_root_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("mnemo").join("memory"))
        .unwrap_or_else(|| std::path::PathBuf::from("mnemo-memory"))
        .to_string_lossy()
        .to_string()
}

fn default_memory_max_bytes() -> usize {
    8 * 1024
}

fn default_daily_tail_entries() -> usize {
    10
}

fn default_vector_weight() -> f64 {
    0.7
}

fn default_keyword_weight() -> f64 {
    0.3
}

fn default_min_score() -> f64 {
    0.1
}

fn default_max_results() -> usize {
    8
}

fn default_chunk_size() -> usize {
    1600
}

fn default_chunk_overlap() -> usize {
    320
}

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// No embeddings; search is keyword-only.
    #[default]
    None,
    /// OpenAI embeddings API.
    #[serde(rename = "openai")]
    OpenAi,
    /// Local Ollama server through its OpenAI-compatible endpoint.
    Ollama,
}

/// Embedding backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,

    /// Embedding model name. Provider default when unset.
    #[serde(default)]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible API. Provider default when unset.
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key. For `openai`, falls back to `providers.openai_api_key` / `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Requested output dimensionality, for models that support truncation.
    #[serde(default)]
    pub dimensions: Option<usize>,

    /// Maximum concurrent embedding requests during a reindex.
    #[serde(default = "default_embedding_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout.
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::None,
            model: None,
            base_url: None,
            api_key: None,
            dimensions: None,
            concurrency: default_embedding_concurrency(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_embedding_concurrency() -> usize {
    4
}

fn default_embedding_timeout_secs() -> u64 {
    30
}

/// Context-window management configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Fraction of the model's context window at which a memory flush runs.
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: f64,

    /// Max tokens per step of the flush sub-turn.
    #[serde(default = "default_flush_max_tokens")]
    pub flush_max_tokens: u32,

    /// Context window assumed for models that do not declare one.
    #[serde(default = "default_context_window")]
    pub default_context_window: u32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            flush_threshold: default_flush_threshold(),
            flush_max_tokens: default_flush_max_tokens(),
            default_context_window: default_context_window(),
        }
    }
}

fn default_flush_threshold() -> f64 {
    0.75
}

fn default_flush_max_tokens() -> u32 {
    1024
}

fn default_context_window() -> u32 {
    128_000
}

/// Provider credentials.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub anthropic_api_key: Option<String>,

    #[serde(default)]
    pub openai_api_key: Option<String>,

    #[serde(default)]
    pub google_api_key: Option<String>,
}

/// Model catalogue configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelsConfig {
    /// Drop the built-in catalogue and use only `catalog`.
    #[serde(default)]
    pub replace_defaults: bool,

    /// Extra entries. An entry whose id matches a built-in one replaces it.
    #[serde(default)]
    pub catalog: Vec<ModelEntry>,
}

/// A model catalogue entry as written in config.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
    pub id: String,

    /// Short display name. Defaults to the id.
    #[serde(default)]
    pub label: Option<String>,

    pub provider: ProviderKind,

    pub tier: ModelTier,

    #[serde(default = "default_true")]
    pub tool_use: bool,

    #[serde(default)]
    pub vision: bool,

    /// Context window in tokens. `context.default_context_window` when unset.
    #[serde(default)]
    pub context_window: Option<u32>,
}

fn default_true() -> bool {
    true
}
