// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mnemo assistant core.

use thiserror::Error;

/// The primary error type used across all Mnemo traits and core operations.
#[derive(Debug, Error)]
pub enum MnemoError {
    /// Configuration errors (invalid values, missing credentials for a requested model).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage errors (index database, memory files on disk).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Memory corpus violations (paths outside the memory root, unusable corpus paths).
    #[error("memory error: {0}")]
    Memory(String),

    /// LLM provider errors (API failure, token limits, model not found).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding backend errors (HTTP failure, malformed response).
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Errors reported by an attached scheduler.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for MnemoError {
    fn from(e: std::io::Error) -> Self {
        MnemoError::Storage {
            source: Box::new(e),
        }
    }
}
