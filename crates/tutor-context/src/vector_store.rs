//! HTTP vector-store gateway (Qdrant-style REST API).
//!
//! Implements the core [`VectorSearch`] trait against a running vector
//! store via `POST /collections/{collection}/points/search`. The
//! [`ScopeFilter`] is translated into payload filter clauses; scored points
//! come back as [`ContentItem`]s with their stored provenance and citation
//! metadata.
//!
//! Any transport or protocol failure surfaces as
//! [`RetrievalError::SearchUnavailable`]; the orchestrator treats the
//! affected scope as empty rather than failing the request.

use std::time::Duration;

use async_trait::async_trait;

use tutor_context_core::error::{Result, RetrievalError};
use tutor_context_core::gateway::{ScopeFilter, VectorSearch};
use tutor_context_core::models::{ContentItem, SourceType};

use crate::config::VectorStoreConfig;

/// Vector search gateway over a Qdrant-compatible REST endpoint.
pub struct QdrantStore {
    base_url: String,
    collection: String,
    client: reqwest::Client,
}

impl QdrantStore {
    /// Create a gateway from configuration. The HTTP client carries a
    /// bounded request timeout and is reused across calls.
    pub fn new(config: &VectorStoreConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            client,
        })
    }
}

/// Translate a [`ScopeFilter`] into a Qdrant filter object.
///
/// Returns `None` for an unrestricted filter (the `filter` key is omitted
/// from the request body entirely).
fn build_filter(scope: &ScopeFilter) -> Option<serde_json::Value> {
    let mut must: Vec<serde_json::Value> = Vec::new();

    if let Some(types) = &scope.source_types {
        let tags: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
        must.push(serde_json::json!({
            "key": "source_type",
            "match": { "any": tags },
        }));
    }
    if let Some(owner_id) = &scope.owner_id {
        must.push(serde_json::json!({
            "key": "owner_id",
            "match": { "value": owner_id },
        }));
    }
    if let Some(source_id) = &scope.source_id {
        must.push(serde_json::json!({
            "key": "source_id",
            "match": { "value": source_id },
        }));
    }

    if must.is_empty() {
        None
    } else {
        Some(serde_json::json!({ "must": must }))
    }
}

/// Convert one scored point into a [`ContentItem`].
///
/// Points with no payload or no text are skipped (`None`): they cannot be
/// used as context. An unknown `source_type` tag degrades to `general`
/// rather than rejecting the point.
fn parse_point(point: &serde_json::Value) -> Option<ContentItem> {
    let id = match point.get("id") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => return None,
    };
    let score = point.get("score").and_then(|s| s.as_f64())?;
    let payload = point.get("payload").and_then(|p| p.as_object())?;

    let text = payload.get("text").and_then(|t| t.as_str())?;
    if text.is_empty() {
        return None;
    }

    let source_type = payload
        .get("source_type")
        .and_then(|t| t.as_str())
        .map(SourceType::parse)
        .unwrap_or(SourceType::General);
    let source_id = payload
        .get("source_id")
        .and_then(|s| s.as_str())
        .unwrap_or(&id)
        .to_string();
    let owner_id = payload
        .get("owner_id")
        .and_then(|o| o.as_str())
        .map(str::to_string);
    let metadata = payload
        .get("metadata")
        .and_then(|m| m.as_object())
        .cloned()
        .unwrap_or_default();

    Some(ContentItem {
        id,
        text: text.to_string(),
        source_type,
        source_id,
        owner_id,
        similarity_score: score,
        metadata,
    })
}

#[async_trait]
impl VectorSearch for QdrantStore {
    async fn search(
        &self,
        vector: &[f32],
        filter: &ScopeFilter,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );

        let mut body = serde_json::json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        });
        if let Some(filter) = build_filter(filter) {
            body["filter"] = filter;
        }

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::SearchUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::SearchUnavailable(format!(
                "vector store error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            RetrievalError::SearchUnavailable(format!("invalid search response: {}", e))
        })?;

        let points = json
            .get("result")
            .and_then(|r| r.as_array())
            .ok_or_else(|| {
                RetrievalError::SearchUnavailable(
                    "invalid search response: missing result".to_string(),
                )
            })?;

        Ok(points.iter().filter_map(parse_point).collect())
    }
}
