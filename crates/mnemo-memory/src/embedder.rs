// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider: an OpenAI-compatible HTTP adapter and a bounded pool.
//!
//! [`HttpEmbedder`] talks to any `/embeddings` endpoint with the OpenAI
//! request shape (OpenAI itself, Ollama's `/v1`). [`EmbeddingPool`] fans chunk
//! texts out to an adapter with a fixed number of requests in flight.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use mnemo_config::model::{EmbeddingConfig, EmbeddingProviderKind, ProvidersConfig};
use mnemo_core::error::MnemoError;
use mnemo_core::traits::{EmbeddingAdapter, PluginAdapter};
use mnemo_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::Chunk;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENAI_DEFAULT_MODEL: &str = "text-embedding-3-small";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
const OLLAMA_DEFAULT_MODEL: &str = "nomic-embed-text";

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Embedding adapter for OpenAI-compatible `/embeddings` APIs.
///
/// Transient failures (429, 500, 503, 529) are retried once; other non-2xx
/// statuses fail immediately.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    name: String,
    url: String,
    model: String,
    dimensions: Option<usize>,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpEmbedder {
    /// Creates an embedder for `{base_url}/embeddings`.
    pub fn new(
        name: &str,
        base_url: &str,
        model: &str,
        api_key: Option<&str>,
        dimensions: Option<usize>,
        timeout: Duration,
    ) -> Result<Self, MnemoError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                MnemoError::Config(format!("invalid embedding API key header value: {e}"))
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MnemoError::Embedding {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            name: name.to_string(),
            url: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            dimensions,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Returns the embedding model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    #[cfg(test)]
    fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MnemoError> {
        let mut body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        if let Some(dims) = self.dimensions {
            body["dimensions"] = serde_json::json!(dims);
        }

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, model = %self.model, "retrying embedding request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.url)
                .json(&body)
                .send()
                .await
                .map_err(|e| MnemoError::Embedding {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "embedding response received");

            if status.is_success() {
                let parsed: EmbeddingResponse =
                    response.json().await.map_err(|e| MnemoError::Embedding {
                        message: format!("failed to parse embedding response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                let mut data = parsed.data;
                data.sort_by_key(|d| d.index);
                return Ok(data.into_iter().map(|d| d.embedding).collect());
            }

            let text = response.text().await.unwrap_or_default();
            let error = MnemoError::Embedding {
                message: format!("embedding API returned {status}: {text}"),
                source: None,
            };
            if is_transient_error(status) && attempt < self.max_retries {
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| MnemoError::Embedding {
            message: "embedding request failed after retries".into(),
            source: None,
        }))
    }
}

/// Returns true for HTTP status codes worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}

#[async_trait]
impl PluginAdapter for HttpEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        match self.request(&["ping".to_string()]).await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for HttpEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MnemoError> {
        let embeddings = self.request(&input.texts).await?;
        if embeddings.len() != input.texts.len() {
            return Err(MnemoError::Embedding {
                message: format!(
                    "expected {} embeddings, got {}",
                    input.texts.len(),
                    embeddings.len()
                ),
                source: None,
            });
        }
        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        if embeddings.iter().any(|e| e.len() != dimensions) {
            return Err(MnemoError::Embedding {
                message: "embeddings in one response have different lengths".into(),
                source: None,
            });
        }
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}

/// Builds the configured embedding adapter, or `None` for keyword-only search.
///
/// For `openai` the API key falls back to `providers.openai_api_key`, then
/// the `OPENAI_API_KEY` environment variable. Without any key the store
/// runs keyword-only.
pub fn embedder_from_config(
    config: &EmbeddingConfig,
    providers: &ProvidersConfig,
) -> Result<Option<Arc<dyn EmbeddingAdapter>>, MnemoError> {
    embedder_from_config_with(config, providers, |var| std::env::var(var).ok())
}

/// Like [`embedder_from_config`], reading environment variables through `env`.
pub fn embedder_from_config_with(
    config: &EmbeddingConfig,
    providers: &ProvidersConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Option<Arc<dyn EmbeddingAdapter>>, MnemoError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let (name, base_url, model, api_key) = match config.provider {
        EmbeddingProviderKind::None => return Ok(None),
        EmbeddingProviderKind::OpenAi => {
            let key = config
                .api_key
                .clone()
                .or_else(|| providers.openai_api_key.clone())
                .or_else(|| env("OPENAI_API_KEY"))
                .filter(|k| !k.trim().is_empty());
            let Some(key) = key else {
                warn!("openai embeddings configured without an API key, using keyword search only");
                return Ok(None);
            };
            ("openai-embeddings", OPENAI_BASE_URL, OPENAI_DEFAULT_MODEL, Some(key))
        }
        EmbeddingProviderKind::Ollama => (
            "ollama-embeddings",
            OLLAMA_BASE_URL,
            OLLAMA_DEFAULT_MODEL,
            config.api_key.clone(),
        ),
    };

    let embedder = HttpEmbedder::new(
        name,
        config.base_url.as_deref().unwrap_or(base_url),
        config.model.as_deref().unwrap_or(model),
        api_key.as_deref(),
        config.dimensions,
        timeout,
    )?;
    Ok(Some(Arc::new(embedder)))
}

/// Runs embedding requests against one adapter with bounded concurrency.
#[derive(Clone)]
pub struct EmbeddingPool {
    adapter: Arc<dyn EmbeddingAdapter>,
    concurrency: usize,
}

impl EmbeddingPool {
    pub fn new(adapter: Arc<dyn EmbeddingAdapter>, concurrency: usize) -> Self {
        Self {
            adapter,
            concurrency: concurrency.max(1),
        }
    }

    /// Embeds a single text (a search query).
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, MnemoError> {
        let output = self
            .adapter
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await?;
        output
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| MnemoError::Embedding {
                message: "embedding adapter returned no vector".into(),
                source: None,
            })
    }

    /// Embeds each chunk, at most `concurrency` requests at a time.
    ///
    /// Returns `(chunk_id, vector)` pairs for the chunks that succeeded. A
    /// failed chunk is logged and left without a vector.
    pub async fn embed_chunks(&self, chunks: &[&Chunk]) -> Vec<(String, Vec<f32>)> {
        futures::stream::iter(chunks.iter().copied())
            .map(|chunk| async move {
                match self.embed_one(&chunk.text).await {
                    Ok(vector) => Some((chunk.id.clone(), vector)),
                    Err(e) => {
                        warn!(chunk_id = %chunk.id, error = %e, "chunk embedding failed");
                        None
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|result| async move { result })
            .boxed()
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_embedder(base_url: &str) -> HttpEmbedder {
        HttpEmbedder::new(
            "test-embeddings",
            base_url,
            "text-embedding-3-small",
            Some("sk-test"),
            None,
            Duration::from_secs(5),
        )
        .unwrap()
        .with_retry_delay(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn embed_returns_vectors_in_index_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "text-embedding-3-small"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0, 0.0]},
                    {"index": 0, "embedding": [1.0, 0.0, 0.0]}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = test_embedder(&server.uri())
            .embed(EmbeddingInput {
                texts: vec!["a".into(), "b".into()],
            })
            .await
            .unwrap();
        assert_eq!(output.dimensions, 3);
        assert_eq!(output.embeddings[0], vec![1.0, 0.0, 0.0]);
        assert_eq!(output.embeddings[1], vec![0.0, 1.0, 0.0]);
    }

    #[tokio::test]
    async fn retries_once_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [0.5, 0.5]}]
            })))
            .mount(&server)
            .await;

        let output = test_embedder(&server.uri())
            .embed(EmbeddingInput {
                texts: vec!["q".into()],
            })
            .await
            .unwrap();
        assert_eq!(output.embeddings, vec![vec![0.5, 0.5]]);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_embedder(&server.uri())
            .embed(EmbeddingInput {
                texts: vec!["q".into()],
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn count_mismatch_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [0.5]}]
            })))
            .mount(&server)
            .await;

        let result = test_embedder(&server.uri())
            .embed(EmbeddingInput {
                texts: vec!["a".into(), "b".into()],
            })
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn none_provider_builds_nothing() {
        let built =
            embedder_from_config(&EmbeddingConfig::default(), &ProvidersConfig::default()).unwrap();
        assert!(built.is_none());
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = EmbeddingConfig {
            provider: EmbeddingProviderKind::Ollama,
            ..EmbeddingConfig::default()
        };
        let built = embedder_from_config(&config, &ProvidersConfig::default()).unwrap();
        assert_eq!(built.unwrap().name(), "ollama-embeddings");
    }

    #[test]
    fn openai_uses_provider_key_fallback() {
        let config = EmbeddingConfig {
            provider: EmbeddingProviderKind::OpenAi,
            ..EmbeddingConfig::default()
        };
        let providers = ProvidersConfig {
            openai_api_key: Some("sk-from-providers".into()),
            ..ProvidersConfig::default()
        };
        let built = embedder_from_config(&config, &providers).unwrap();
        assert_eq!(built.unwrap().name(), "openai-embeddings");
    }

    #[test]
    fn openai_without_key_falls_back_to_keyword_only() {
        let config = EmbeddingConfig {
            provider: EmbeddingProviderKind::OpenAi,
            api_key: Some("  ".into()),
            ..EmbeddingConfig::default()
        };
        let built =
            embedder_from_config_with(&config, &ProvidersConfig::default(), |_| None).unwrap();
        assert!(built.is_none());
    }

    #[test]
    fn openai_reads_key_from_env() {
        let config = EmbeddingConfig {
            provider: EmbeddingProviderKind::OpenAi,
            ..EmbeddingConfig::default()
        };
        let built = embedder_from_config_with(&config, &ProvidersConfig::default(), |var| {
            (var == "OPENAI_API_KEY").then(|| "sk-env".to_string())
        })
        .unwrap();
        assert_eq!(built.unwrap().name(), "openai-embeddings");
    }
}
