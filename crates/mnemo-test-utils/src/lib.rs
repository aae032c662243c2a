// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mnemo integration tests.
//!
//! Provides deterministic doubles so no test reaches a network.
//!
//! # Components
//!
//! - [`MockProvider`] - Scripted LLM provider that records requests
//! - [`MockEmbedder`] - Hashed bag-of-words embedding adapter
//! - [`MockProviderFactory`] - Provider factory serving one mock provider
//! - [`InMemoryScheduler`] - Scheduler with manual job firing

pub mod mock_embedder;
pub mod mock_factory;
pub mod mock_provider;
pub mod scheduler;

pub use mock_embedder::MockEmbedder;
pub use mock_factory::MockProviderFactory;
pub use mock_provider::{MockProvider, Scripted, text_response, tool_response};
pub use scheduler::InMemoryScheduler;
