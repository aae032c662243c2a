// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic embedding adapter.
//!
//! Each lowercase alphanumeric token is hashed into one of `dims` buckets and
//! the counts are L2-normalized, so texts sharing words have positive cosine
//! similarity and identical texts embed identically.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use mnemo_core::MnemoError;
use mnemo_core::traits::{EmbeddingAdapter, PluginAdapter};
use mnemo_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};

/// A hashed bag-of-words embedder that counts its calls.
pub struct MockEmbedder {
    dims: usize,
    calls: AtomicUsize,
    fail_on: Option<String>,
}

impl MockEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims: dims.max(1),
            calls: AtomicUsize::new(0),
            fail_on: None,
        }
    }

    /// Fails any request whose text contains `needle`.
    pub fn failing_on(dims: usize, needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            ..Self::new(dims)
        }
    }

    /// Number of `embed` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The vector for one text.
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        let mut any = false;
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = fnv1a(&token.to_lowercase()) as usize % self.dims;
            v[bucket] += 1.0;
            any = true;
        }
        if !any {
            v[0] = 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.iter_mut().for_each(|x| *x /= norm);
        v
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf29ce484222325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x100000001b3)
    })
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MnemoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(needle) = &self.fail_on {
            if input.texts.iter().any(|t| t.contains(needle.as_str())) {
                return Err(MnemoError::Embedding {
                    message: format!("mock embedder refuses text containing {needle:?}"),
                    source: None,
                });
            }
        }
        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| self.vector(t)).collect(),
            dimensions: self.dims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn identical_texts_embed_identically() {
        let e = MockEmbedder::new(32);
        assert_eq!(e.vector("Tea with lemon"), e.vector("tea WITH lemon"));
    }

    #[test]
    fn shared_words_are_similar() {
        let e = MockEmbedder::new(64);
        let a = e.vector("the cat sleeps");
        let b = e.vector("a cat");
        assert!(cosine(&a, &b) > 0.0);
    }

    #[test]
    fn vectors_are_unit_length() {
        let e = MockEmbedder::new(8);
        for text in ["", "one", "one two three four five six seven"] {
            let v = e.vector(text);
            assert!((cosine(&v, &v) - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn failing_on_needle() {
        let e = MockEmbedder::failing_on(8, "secret");
        let ok = e
            .embed(EmbeddingInput {
                texts: vec!["fine".into()],
            })
            .await;
        assert!(ok.is_ok());
        let err = e
            .embed(EmbeddingInput {
                texts: vec!["top secret".into()],
            })
            .await;
        assert!(err.is_err());
        assert_eq!(e.calls(), 2);
    }
}
