// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model registry for the Mnemo agent.
//!
//! This crate provides:
//! - [`ModelSpec`] and [`default_catalog`]: the model catalogue as plain data
//! - [`Credentials`]: per-provider API key detection
//! - [`ModelRegistry`]: name resolution with custom-model fallback and
//!   tier-based selection among credentialed providers
//! - [`ProviderFactory`] / [`ModelHandle`]: the seam where a selected model
//!   becomes a callable provider

pub mod catalog;
pub mod credentials;
pub mod registry;

pub use catalog::{DEFAULT_CONTEXT_WINDOW, ModelSpec, catalog_from_config, default_catalog};
pub use credentials::Credentials;
pub use registry::{ModelHandle, ModelInfo, ModelRegistry, ProviderFactory};
