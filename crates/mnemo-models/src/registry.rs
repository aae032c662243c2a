// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model selection over an injected catalogue.
//!
//! Lookup order for a user-supplied name: catalogue id or label, then a
//! custom entry built from the name itself. Tier selection only considers
//! models whose provider has a credential.

use std::sync::Arc;

use mnemo_config::MnemoConfig;
use mnemo_core::error::MnemoError;
use mnemo_core::traits::ProviderAdapter;
use mnemo_core::types::{ModelTier, ProviderKind};
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{DEFAULT_CONTEXT_WINDOW, ModelSpec, catalog_from_config};
use crate::credentials::Credentials;

/// A catalogue entry annotated with whether it can be used right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    #[serde(flatten)]
    pub spec: ModelSpec,
    pub available: bool,
}

/// Builds a callable provider for a model.
///
/// SDK wiring lives behind this trait; the registry only decides which model.
pub trait ProviderFactory: Send + Sync {
    fn build(
        &self,
        spec: &ModelSpec,
        credentials: &Credentials,
    ) -> Result<Arc<dyn ProviderAdapter>, MnemoError>;
}

/// A resolved model paired with the provider that serves it.
#[derive(Clone)]
pub struct ModelHandle {
    pub spec: ModelSpec,
    pub provider: Arc<dyn ProviderAdapter>,
}

impl ModelHandle {
    pub fn new(spec: ModelSpec, provider: Arc<dyn ProviderAdapter>) -> Self {
        Self { spec, provider }
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("spec", &self.spec)
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// Catalogue plus detected credentials.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    catalog: Vec<ModelSpec>,
    credentials: Credentials,
    default_context_window: u32,
}

impl ModelRegistry {
    pub fn new(catalog: Vec<ModelSpec>, credentials: Credentials) -> Self {
        Self {
            catalog,
            credentials,
            default_context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }

    /// Catalogue from `[models]`, credentials from `[providers]` and the
    /// environment.
    pub fn from_config(config: &MnemoConfig) -> Self {
        let registry = Self::new(
            catalog_from_config(&config.models),
            Credentials::detect(&config.providers),
        )
        .with_default_context_window(config.context.default_context_window);
        info!(
            models = registry.catalog.len(),
            providers = ?registry.credentials.providers(),
            "model registry ready"
        );
        registry
    }

    /// Context window given to custom models.
    pub fn with_default_context_window(mut self, window: u32) -> Self {
        self.default_context_window = window;
        self
    }

    pub fn catalog(&self) -> &[ModelSpec] {
        &self.catalog
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn is_available(&self, spec: &ModelSpec) -> bool {
        self.credentials.has(spec.provider)
    }

    /// Catalogue entry whose id or label matches `name`, ignoring case.
    pub fn find(&self, name: &str) -> Option<&ModelSpec> {
        self.catalog.iter().find(|m| m.matches(name))
    }

    /// Resolves `name` to a catalogue entry, or accepts it verbatim as a
    /// custom model.
    pub fn resolve(&self, name: &str) -> ModelSpec {
        if let Some(spec) = self.find(name) {
            return spec.clone();
        }

        let name = name.trim();
        let provider = infer_provider(name)
            .or_else(|| self.credentials.providers().first().copied())
            .unwrap_or(ProviderKind::Anthropic);
        debug!(model = name, %provider, "unrecognised model id, using custom entry");

        ModelSpec {
            id: name.to_string(),
            label: name.to_string(),
            provider,
            tier: ModelTier::Smart,
            tool_use: true,
            vision: false,
            context_window: self.default_context_window,
            custom: true,
        }
    }

    /// Best available model for `tier`.
    ///
    /// Preference: a tool-capable model in the tier, then a tool-capable
    /// model in the nearest other tier, then any available model.
    pub fn pick_best(&self, tier: ModelTier) -> Option<ModelSpec> {
        let available: Vec<&ModelSpec> = self.catalog.iter().filter(|m| self.is_available(m)).collect();

        let in_tier = available.iter().find(|m| m.tier == tier && m.tool_use);
        if let Some(spec) = in_tier {
            return Some((*spec).clone());
        }

        let nearest_tool_capable = available
            .iter()
            .filter(|m| m.tool_use)
            .min_by_key(|m| (m.tier as i32 - tier as i32).abs());
        if let Some(spec) = nearest_tool_capable {
            return Some((*spec).clone());
        }

        available.first().map(|spec| (*spec).clone())
    }

    /// Every catalogue entry with its availability.
    pub fn list(&self) -> Vec<ModelInfo> {
        self.catalog
            .iter()
            .map(|spec| ModelInfo {
                spec: spec.clone(),
                available: self.is_available(spec),
            })
            .collect()
    }

    /// Builds a callable handle for `spec`.
    pub fn build_handle(
        &self,
        spec: ModelSpec,
        factory: &dyn ProviderFactory,
    ) -> Result<ModelHandle, MnemoError> {
        let provider = factory.build(&spec, &self.credentials)?;
        Ok(ModelHandle::new(spec, provider))
    }
}

/// Provider implied by a model id's prefix.
fn infer_provider(id: &str) -> Option<ProviderKind> {
    let id = id.to_ascii_lowercase();
    if id.starts_with("claude") {
        Some(ProviderKind::Anthropic)
    } else if ["gpt", "o1", "o3", "o4"].iter().any(|p| id.starts_with(p)) {
        Some(ProviderKind::OpenAi)
    } else if id.starts_with("gemini") {
        Some(ProviderKind::Google)
    } else {
        None
    }
}
