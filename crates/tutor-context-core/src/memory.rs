//! In-memory [`VectorSearch`] implementation for testing and embedded use.
//!
//! Brute-force cosine similarity over `RwLock`-guarded records. Negative
//! cosine values are floored to `0.0` so that similarity scores stay in the
//! `[0, 1]` range the prioritizer expects.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::gateway::{ScopeFilter, VectorSearch};
use crate::models::{ContentItem, SourceType};
use crate::vector::cosine_similarity;

/// One indexed chunk: provenance, citation metadata, and its vector.
#[derive(Debug, Clone)]
pub struct IndexedContent {
    pub id: String,
    pub text: String,
    pub source_type: SourceType,
    pub source_id: String,
    pub owner_id: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub vector: Vec<f32>,
}

/// In-memory vector index.
pub struct InMemoryIndex {
    records: RwLock<Vec<IndexedContent>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Add a record to the index.
    pub fn insert(&self, record: IndexedContent) {
        self.records.write().unwrap().push(record);
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorSearch for InMemoryIndex {
    async fn search(
        &self,
        vector: &[f32],
        filter: &ScopeFilter,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let records = self.records.read().unwrap();
        let mut items: Vec<ContentItem> = records
            .iter()
            .filter(|r| filter.matches(r.source_type, r.owner_id.as_deref(), &r.source_id))
            .map(|r| ContentItem {
                id: r.id.clone(),
                text: r.text.clone(),
                source_type: r.source_type,
                source_id: r.source_id.clone(),
                owner_id: r.owner_id.clone(),
                similarity_score: f64::from(cosine_similarity(vector, &r.vector).max(0.0)),
                metadata: r.metadata.clone(),
            })
            .collect();

        items.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        items.truncate(limit);
        Ok(items)
    }
}
