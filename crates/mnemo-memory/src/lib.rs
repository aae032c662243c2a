// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory for Mnemo.
//!
//! A user's memory is plain Markdown on disk: a curated `MEMORY.md` and one
//! append-only log per day. [`MemoryStore`] owns that corpus and keeps a
//! SQLite index of it in sync; [`MemoryIndexer`] answers hybrid queries that
//! combine FTS5 keyword relevance with sqlite-vec similarity when an
//! embedding provider is configured, and keyword relevance alone otherwise.

pub mod chunker;
pub mod clock;
pub mod embedder;
pub mod indexer;
pub mod retriever;
pub mod sections;
pub mod store;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use embedder::{EmbeddingPool, HttpEmbedder, embedder_from_config, embedder_from_config_with};
pub use indexer::MemoryIndexer;
pub use retriever::merge_hybrid_results;
pub use sections::merge_sections;
pub use store::MemoryStore;
pub use types::{
    Chunk, DAILY_DIR, IndexStats, LONG_TERM_FILE, MemorySource, SearchResult, SearchSettings,
};
