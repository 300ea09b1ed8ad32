//! Embedding gateway implementations.
//!
//! Concrete [`Embedder`] backends behind the core trait:
//! - **[`DisabledEmbedder`]** — always unavailable; used when embeddings are
//!   not configured, which degrades every retrieval to an empty context.
//! - **[`OpenAiEmbedder`]** — calls an OpenAI-compatible embeddings API with
//!   retry and backoff.
//!
//! # Retry Strategy
//!
//! The OpenAI backend uses exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! All terminal failures surface as
//! [`RetrievalError::EmbeddingUnavailable`] so the orchestrator can degrade
//! gracefully instead of crashing the request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use tutor_context_core::error::{Result, RetrievalError};
use tutor_context_core::gateway::Embedder;

use crate::config::EmbeddingConfig;

/// A no-op embedder that always reports the provider as unavailable.
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn dims(&self) -> usize {
        0
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RetrievalError::EmbeddingUnavailable(
            "embedding provider is disabled".to_string(),
        ))
    }
}

/// Embedding gateway for an OpenAI-compatible `POST /v1/embeddings` API.
///
/// Requires the `OPENAI_API_KEY` environment variable. The HTTP client is
/// built once and reused across requests.
pub struct OpenAiEmbedder {
    model: String,
    dims: usize,
    base_url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    /// Create a new provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` or `dims` is not set in config, or if
    /// `OPENAI_API_KEY` is not in the environment.
    pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for OpenAI provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            dims,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_retries: config.max_retries,
            client,
        })
    }

    async fn request_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": [text],
        });

        let mut last_err: Option<RetrievalError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await.map_err(|e| {
                            RetrievalError::EmbeddingUnavailable(format!(
                                "invalid embeddings response: {}",
                                e
                            ))
                        })?;
                        return parse_embeddings_response(&json)?
                            .into_iter()
                            .next()
                            .ok_or_else(|| {
                                RetrievalError::EmbeddingUnavailable(
                                    "empty embeddings response".to_string(),
                                )
                            });
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err = RetrievalError::EmbeddingUnavailable(format!(
                        "embeddings API error {}: {}",
                        status, body_text
                    ));

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(err);
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    return Err(err);
                }
                Err(e) => {
                    last_err = Some(RetrievalError::EmbeddingUnavailable(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            RetrievalError::EmbeddingUnavailable("embedding failed after retries".to_string())
        }))
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request_embedding(text).await
    }
}

/// Parse an OpenAI-style embeddings response body.
///
/// Extracts the `data[].embedding` arrays and returns them in order.
fn parse_embeddings_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json.get("data").and_then(|d| d.as_array()).ok_or_else(|| {
        RetrievalError::EmbeddingUnavailable("invalid embeddings response: missing data".to_string())
    })?;

    let mut embeddings = Vec::with_capacity(data.len());

    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                RetrievalError::EmbeddingUnavailable(
                    "invalid embeddings response: missing embedding".to_string(),
                )
            })?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        embeddings.push(vec);
    }

    Ok(embeddings)
}

/// Create the appropriate [`Embedder`] based on configuration.
///
/// | Config Value | Backend |
/// |--------------|---------|
/// | `"disabled"` | [`DisabledEmbedder`] |
/// | `"openai"` | [`OpenAiEmbedder`] |
pub fn create_embedder(config: &EmbeddingConfig) -> anyhow::Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledEmbedder)),
        "openai" => Ok(Arc::new(OpenAiEmbedder::new(config)?)),
        other => anyhow::bail!("Unknown embedding provider: {}", other),
    }
}
