// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core types for the memory corpus and its index.

use mnemo_config::model::MemoryConfig;
use serde::{Deserialize, Serialize};

/// Corpus-relative path of the long-term memory file.
pub const LONG_TERM_FILE: &str = "MEMORY.md";

/// Corpus-relative directory holding one log per calendar day.
pub const DAILY_DIR: &str = "daily";

/// Maximum snippet length in characters.
pub const SNIPPET_MAX_CHARS: usize = 700;

/// A contiguous line range of a corpus file; the unit of indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// `path:start_line:hash-prefix`; stable while the range and its text are unchanged.
    pub id: String,
    pub path: String,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
    pub text: String,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
}

/// Which layer of the corpus a hit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemorySource {
    /// The long-term file (or any non-daily file).
    Memory,
    /// A dated daily log.
    Daily,
}

impl MemorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemorySource::Memory => "memory",
            MemorySource::Daily => "daily",
        }
    }

    /// Derives the source from a corpus-relative path.
    pub fn from_path(path: &str) -> Self {
        if path.starts_with("daily/") {
            MemorySource::Daily
        } else {
            MemorySource::Memory
        }
    }
}

/// A ranked search hit. Produced per query, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub path: String,
    pub start_line: usize,
    pub end_line: usize,
    /// Relative score; only meaningful against other hits of the same query.
    pub score: f64,
    pub snippet: String,
    pub source: MemorySource,
}

/// A raw hit from one modality, before merging.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    pub path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
    /// Larger is better.
    pub score: f64,
}

/// Search and chunking parameters taken from [`MemoryConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub vector_weight: f64,
    pub keyword_weight: f64,
    pub min_score: f64,
    pub max_results: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl From<&MemoryConfig> for SearchSettings {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            vector_weight: config.vector_weight,
            keyword_weight: config.keyword_weight,
            min_score: config.min_score,
            max_results: config.max_results,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&MemoryConfig::default())
    }
}

/// Index size summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub files: usize,
    pub chunks: usize,
    pub vectors: usize,
    /// Dimensionality of the vector index, if one has been created.
    pub dimensions: Option<usize>,
}

/// Encodes an f32 vector as little-endian bytes for sqlite-vec.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Cuts `text` to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
