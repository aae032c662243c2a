// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mnemo assistant core.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Mnemo workspace. Model providers,
//! embedding backends, and schedulers plug in through the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MnemoError;
pub use types::{AdapterType, HealthStatus, ModelTier, ProviderKind};

// Re-export all adapter traits at crate root.
pub use traits::{EmbeddingAdapter, JobHandler, PluginAdapter, ProviderAdapter, Scheduler};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemo_error_has_all_variants() {
        let _config = MnemoError::Config("test".into());
        let _storage = MnemoError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _memory = MnemoError::Memory("test".into());
        let _provider = MnemoError::Provider {
            message: "test".into(),
            source: None,
        };
        let _embedding = MnemoError::Embedding {
            message: "test".into(),
            source: None,
        };
        let _scheduler = MnemoError::Scheduler("test".into());
        let _internal = MnemoError::Internal("test".into());
    }

    #[test]
    fn error_display_is_prefixed_by_category() {
        let err = MnemoError::Provider {
            message: "rate limited".into(),
            source: None,
        };
        assert_eq!(err.to_string(), "provider error: rate limited");

        let err = MnemoError::Memory("path escapes memory root".into());
        assert_eq!(err.to_string(), "memory error: path escapes memory root");
    }

    #[test]
    fn adapter_type_display_round_trip() {
        use std::str::FromStr;

        for variant in [AdapterType::Provider, AdapterType::Embedding] {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
        fn _assert_scheduler<T: Scheduler>() {}
        fn _assert_job_handler<T: JobHandler>() {}
    }
}
