//! Gateway traits for the two external collaborators of the pipeline.
//!
//! The [`Embedder`] turns text into a fixed-length vector; the
//! [`VectorSearch`] returns scored content items for a vector and a scope
//! filter. Both are opaque to the core: concrete implementations (HTTP
//! providers, the in-memory index) live in the application crate and in
//! [`crate::memory`].
//!
//! Implementations must be `Send + Sync` so a single long-lived client can
//! be shared across concurrent retrieval calls.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ContentItem, SourceType};

/// Embedding gateway.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;

    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::EmbeddingUnavailable`](crate::error::RetrievalError::EmbeddingUnavailable)
    /// when the underlying provider errors or times out.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Vector search gateway.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Return up to `limit` nearest content items for `vector` within the
    /// given scope, best first. No matches is `Ok(vec![])`, never an error.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::SearchUnavailable`](crate::error::RetrievalError::SearchUnavailable)
    /// when the backend errors or times out.
    async fn search(
        &self,
        vector: &[f32],
        filter: &ScopeFilter,
        limit: usize,
    ) -> Result<Vec<ContentItem>>;
}

/// Scope restriction for one search: which source categories, which owner,
/// which document. All fields are conjunctive; `None` means unrestricted.
#[derive(Debug, Clone, Default)]
pub struct ScopeFilter {
    /// Restrict to these source categories.
    pub source_types: Option<Vec<SourceType>>,
    /// Restrict to items owned by this user.
    pub owner_id: Option<String>,
    /// Restrict to chunks of this document.
    pub source_id: Option<String>,
}

impl ScopeFilter {
    /// The requesting user's own uploaded materials.
    pub fn user_materials(owner_id: impl Into<String>) -> Self {
        Self {
            source_types: Some(vec![SourceType::UserMaterial]),
            owner_id: Some(owner_id.into()),
            source_id: None,
        }
    }

    /// Chunks of one specific book, whatever tag they were stored under.
    pub fn book(book_id: impl Into<String>) -> Self {
        Self {
            source_types: None,
            owner_id: None,
            source_id: Some(book_id.into()),
        }
    }

    /// The shared fallback corpus: knowledge base, recommended books, and
    /// general content.
    pub fn knowledge_base() -> Self {
        Self {
            source_types: Some(vec![
                SourceType::KnowledgeBase,
                SourceType::RecommendedBook,
                SourceType::General,
            ]),
            owner_id: None,
            source_id: None,
        }
    }

    /// Whether an item with the given provenance passes this filter.
    pub fn matches(
        &self,
        source_type: SourceType,
        owner_id: Option<&str>,
        source_id: &str,
    ) -> bool {
        if let Some(types) = &self.source_types {
            if !types.contains(&source_type) {
                return false;
            }
        }
        if let Some(owner) = &self.owner_id {
            if owner_id != Some(owner.as_str()) {
                return false;
            }
        }
        if let Some(source) = &self.source_id {
            if source_id != source {
                return false;
            }
        }
        true
    }
}
