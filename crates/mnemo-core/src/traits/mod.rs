// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the pluggable parts of the assistant core.
//!
//! Providers and embedding backends extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility. The scheduler traits
//! describe an external capability the agent consumes.

pub mod adapter;
pub mod embedding;
pub mod provider;
pub mod scheduler;

pub use adapter::PluginAdapter;
pub use embedding::EmbeddingAdapter;
pub use provider::ProviderAdapter;
pub use scheduler::{JobHandler, Scheduler};
