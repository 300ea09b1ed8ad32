//! Core data models used throughout Tutor Context.
//!
//! These types represent the content items, ranked results, and citations
//! that flow through the retrieval pipeline. All of them are query-time
//! projections: durable storage lives behind the vector-store gateway, and
//! everything here exists only for the duration of one retrieval call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of origin for a content chunk, used to weight source trust.
///
/// The enumeration is closed, but deserialization and [`parse`](SourceType::parse)
/// map any unrecognized tag to [`General`](SourceType::General) so that an
/// unexpected tag in a stored payload degrades a single item's priority
/// instead of failing the whole query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Material the user uploaded themselves.
    UserMaterial,
    /// A book the user pinned as their preferred reference.
    SelectedBook,
    /// A book recommended by the platform but not pinned.
    RecommendedBook,
    /// A curated knowledge-base entry.
    KnowledgeBase,
    /// Anything else, including unrecognized tags.
    #[serde(other)]
    General,
}

impl SourceType {
    /// Fixed trust weight for this source category.
    ///
    /// Weights are monotonically decreasing from user materials down to
    /// general content. This ordering is the core business rule: content
    /// the user chose always outweighs content the platform supplied.
    pub fn priority_weight(&self) -> f64 {
        match self {
            SourceType::UserMaterial => 1.0,
            SourceType::SelectedBook => 0.8,
            SourceType::RecommendedBook => 0.6,
            SourceType::KnowledgeBase => 0.5,
            SourceType::General => 0.1,
        }
    }

    /// Parse a stored tag, mapping unknown tags to [`General`](SourceType::General).
    pub fn parse(tag: &str) -> Self {
        match tag {
            "user_material" => SourceType::UserMaterial,
            "selected_book" => SourceType::SelectedBook,
            "recommended_book" => SourceType::RecommendedBook,
            "knowledge_base" => SourceType::KnowledgeBase,
            _ => SourceType::General,
        }
    }

    /// The snake_case tag used in stored payloads and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::UserMaterial => "user_material",
            SourceType::SelectedBook => "selected_book",
            SourceType::RecommendedBook => "recommended_book",
            SourceType::KnowledgeBase => "knowledge_base",
            SourceType::General => "general",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrievable unit: one chunk of text with its provenance and the
/// similarity score assigned by the vector search backend.
#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    /// Opaque unique identifier (minted by the backing store).
    pub id: String,
    /// The chunk's textual content.
    pub text: String,
    /// Category of origin; drives the priority weight.
    pub source_type: SourceType,
    /// Identifier of the owning document (material, book, or KB entry).
    pub source_id: String,
    /// Owning user, present only for user materials.
    pub owner_id: Option<String>,
    /// Similarity in `[0.0, 1.0]` from vector search; higher = more relevant.
    pub similarity_score: f64,
    /// Open key-value map (title, author, page, chapter). Used only for
    /// citation rendering, never for ranking.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ContentItem {
    /// Read a metadata value as a display string (strings and numbers).
    pub fn metadata_display(&self, key: &str) -> Option<String> {
        match self.metadata.get(key) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A [`ContentItem`] with its computed ranking position.
#[derive(Debug, Clone, Serialize)]
pub struct RankedItem {
    /// The underlying content item.
    pub item: ContentItem,
    /// The fixed trust weight of the item's source type.
    pub priority_weight: f64,
    /// `α · priority_weight + (1-α) · similarity_score`; see [`crate::rank`].
    pub combined_score: f64,
    /// 1-based position after sorting.
    pub rank: usize,
}

/// User-facing attribution record for one contributing source.
#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    /// Identifier of the cited source document.
    pub source_id: String,
    /// Display title; falls back to `source_id` when metadata has none.
    pub title: String,
    /// Author, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Best combined score among this source's chunks, clamped to `[0, 1]`
    /// and rounded to two decimals for display.
    pub confidence: f64,
    /// Page or chapter locator, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    /// When the citation was assembled.
    pub created_at: DateTime<Utc>,
}

/// The assembled retrieval context returned to the response generator.
#[derive(Debug, Clone, Serialize)]
pub struct ContextBundle {
    /// Top-K ranked content items, best first.
    pub ranked_items: Vec<RankedItem>,
    /// One citation per unique contributing source.
    pub citations: Vec<Citation>,
    /// False when the query embedding could not be obtained; the caller is
    /// expected to fall back to a non-grounded answer.
    pub context_available: bool,
}

impl ContextBundle {
    /// An available context with the given items and citations.
    pub fn available(ranked_items: Vec<RankedItem>, citations: Vec<Citation>) -> Self {
        Self {
            ranked_items,
            citations,
            context_available: true,
        }
    }

    /// The degraded, empty context used when embedding fails.
    pub fn unavailable() -> Self {
        Self {
            ranked_items: Vec::new(),
            citations: Vec::new(),
            context_available: false,
        }
    }
}
