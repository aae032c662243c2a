// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider factory that hands out one shared mock provider.

use std::sync::{Arc, Mutex};

use mnemo_core::MnemoError;
use mnemo_core::traits::ProviderAdapter;
use mnemo_models::{Credentials, ModelSpec, ProviderFactory};

use crate::mock_provider::MockProvider;

/// Builds every model as the same [`MockProvider`] and remembers which model
/// ids were requested.
pub struct MockProviderFactory {
    provider: Arc<MockProvider>,
    built: Mutex<Vec<String>>,
}

impl MockProviderFactory {
    pub fn new(provider: Arc<MockProvider>) -> Self {
        Self {
            provider,
            built: Mutex::new(Vec::new()),
        }
    }

    pub fn provider(&self) -> Arc<MockProvider> {
        self.provider.clone()
    }

    /// Model ids built so far, in order.
    pub fn built(&self) -> Vec<String> {
        self.built
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ProviderFactory for MockProviderFactory {
    fn build(
        &self,
        spec: &ModelSpec,
        _credentials: &Credentials,
    ) -> Result<Arc<dyn ProviderAdapter>, MnemoError> {
        self.built
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(spec.id.clone());
        Ok(self.provider.clone())
    }
}
