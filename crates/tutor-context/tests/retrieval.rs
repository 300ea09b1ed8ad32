//! End-to-end retrieval pipeline tests against the in-memory index.
//!
//! These drive the orchestrator through stub gateways: a fixed-vector
//! embedder, an embedder that is always down, and index wrappers that fail
//! or hang for selected scopes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use tutor_context::retrieve::{RetrieveRequest, Retriever, RetrieverOptions};
use tutor_context_core::error::{Result, RetrievalError};
use tutor_context_core::gateway::{Embedder, ScopeFilter, VectorSearch};
use tutor_context_core::memory::{IndexedContent, InMemoryIndex};
use tutor_context_core::models::{ContentItem, SourceType};

/// Embedder returning a fixed query vector.
struct StaticEmbedder {
    vector: Vec<f32>,
}

#[async_trait]
impl Embedder for StaticEmbedder {
    fn model_name(&self) -> &str {
        "static-test"
    }
    fn dims(&self) -> usize {
        self.vector.len()
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(self.vector.clone())
    }
}

/// Embedder whose provider is always down.
struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing-test"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RetrievalError::EmbeddingUnavailable(
            "provider down".to_string(),
        ))
    }
}

/// Index wrapper that fails every user-materials search but delegates the
/// other scopes.
struct FlakyUserScopeIndex {
    inner: InMemoryIndex,
}

#[async_trait]
impl VectorSearch for FlakyUserScopeIndex {
    async fn search(
        &self,
        vector: &[f32],
        filter: &ScopeFilter,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let targets_user_scope = filter
            .source_types
            .as_ref()
            .is_some_and(|types| types.contains(&SourceType::UserMaterial));
        if targets_user_scope {
            return Err(RetrievalError::SearchUnavailable(
                "user materials shard offline".to_string(),
            ));
        }
        self.inner.search(vector, filter, limit).await
    }
}

/// Index that hangs longer than any scope timeout.
struct HangingIndex;

#[async_trait]
impl VectorSearch for HangingIndex {
    async fn search(
        &self,
        _vector: &[f32],
        _filter: &ScopeFilter,
        _limit: usize,
    ) -> Result<Vec<ContentItem>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

/// Unit vector whose cosine similarity with `[1, 0]` is exactly `sim`.
fn vector_for(sim: f32) -> Vec<f32> {
    vec![sim, (1.0 - sim * sim).max(0.0).sqrt()]
}

fn record(
    id: &str,
    source_type: SourceType,
    source_id: &str,
    owner_id: Option<&str>,
    text: &str,
    sim: f32,
) -> IndexedContent {
    IndexedContent {
        id: id.to_string(),
        text: text.to_string(),
        source_type,
        source_id: source_id.to_string(),
        owner_id: owner_id.map(str::to_string),
        metadata: serde_json::Map::new(),
        vector: vector_for(sim),
    }
}

fn retriever(index: Arc<dyn VectorSearch>) -> Retriever {
    Retriever::new(
        Arc::new(StaticEmbedder {
            vector: vec![1.0, 0.0],
        }),
        index,
        RetrieverOptions::default(),
    )
}

fn question(text: &str) -> RetrieveRequest {
    RetrieveRequest {
        question: text.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_user_material_outranks_more_similar_knowledge_base() {
    let index = InMemoryIndex::new();
    index.insert(record(
        "c1",
        SourceType::UserMaterial,
        "mat-1",
        Some("u1"),
        "my momentum notes",
        0.5,
    ));
    index.insert(record(
        "c2",
        SourceType::KnowledgeBase,
        "kb-1",
        None,
        "momentum article",
        0.9,
    ));

    let retriever = retriever(Arc::new(index));
    let request = RetrieveRequest {
        owner_id: Some("u1".to_string()),
        ..question("what is momentum?")
    };
    let bundle = retriever.retrieve(&request).await.unwrap();

    assert!(bundle.context_available);
    assert_eq!(bundle.ranked_items.len(), 2);
    assert_eq!(bundle.ranked_items[0].item.id, "c1");
    assert!((bundle.ranked_items[0].combined_score - 0.8).abs() < 1e-3);
    assert!((bundle.ranked_items[1].combined_score - 0.66).abs() < 1e-3);
}

#[tokio::test]
async fn test_top_k_bound_and_descending_order() {
    let index = InMemoryIndex::new();
    index.insert(record("a", SourceType::General, "g-1", None, "one", 0.9));
    index.insert(record("b", SourceType::General, "g-2", None, "two", 0.8));
    index.insert(record("c", SourceType::General, "g-3", None, "three", 0.95));

    let retriever = retriever(Arc::new(index));
    let request = RetrieveRequest {
        top_k: Some(2),
        ..question("anything")
    };
    let bundle = retriever.retrieve(&request).await.unwrap();

    assert_eq!(bundle.ranked_items.len(), 2);
    assert_eq!(bundle.ranked_items[0].item.id, "c");
    assert_eq!(bundle.ranked_items[1].item.id, "a");
    for pair in bundle.ranked_items.windows(2) {
        assert!(pair[0].combined_score >= pair[1].combined_score);
    }
}

#[tokio::test]
async fn test_duplicate_passages_from_one_source_collapse() {
    let index = InMemoryIndex::new();
    index.insert(record(
        "c1",
        SourceType::KnowledgeBase,
        "bookA",
        None,
        "Newton's first law of motion.",
        0.7,
    ));
    index.insert(record(
        "c2",
        SourceType::KnowledgeBase,
        "bookA",
        None,
        "newton's  first law of motion.",
        0.85,
    ));

    let retriever = retriever(Arc::new(index));
    let bundle = retriever.retrieve(&question("inertia")).await.unwrap();

    assert_eq!(bundle.ranked_items.len(), 1);
    assert_eq!(bundle.ranked_items[0].item.id, "c2");
}

#[tokio::test]
async fn test_one_citation_per_source_with_metadata() {
    let index = InMemoryIndex::new();
    let mut chunk_one = record(
        "c1",
        SourceType::KnowledgeBase,
        "kb-mech",
        None,
        "torque is a twisting force",
        0.9,
    );
    chunk_one.metadata = serde_json::json!({"title": "Mechanics Primer", "page": 12})
        .as_object()
        .unwrap()
        .clone();
    let mut chunk_two = record(
        "c2",
        SourceType::KnowledgeBase,
        "kb-mech",
        None,
        "torque equals force times lever arm",
        0.8,
    );
    chunk_two.metadata = chunk_one.metadata.clone();
    index.insert(chunk_one);
    index.insert(chunk_two);
    index.insert(record(
        "c3",
        SourceType::General,
        "g-1",
        None,
        "unrelated trivia",
        0.4,
    ));

    let retriever = retriever(Arc::new(index));
    let bundle = retriever.retrieve(&question("what is torque?")).await.unwrap();

    assert_eq!(bundle.ranked_items.len(), 3);
    assert_eq!(bundle.citations.len(), 2);
    assert_eq!(bundle.citations[0].source_id, "kb-mech");
    assert_eq!(bundle.citations[0].title, "Mechanics Primer");
    assert_eq!(bundle.citations[0].locator.as_deref(), Some("page 12"));
    assert_eq!(bundle.citations[1].source_id, "g-1");
    assert_eq!(bundle.citations[1].title, "g-1");
}

#[tokio::test]
async fn test_embedding_failure_degrades_to_unavailable_context() {
    let index = InMemoryIndex::new();
    index.insert(record("a", SourceType::General, "g-1", None, "one", 0.9));

    let retriever = Retriever::new(
        Arc::new(FailingEmbedder),
        Arc::new(index),
        RetrieverOptions::default(),
    );
    let bundle = retriever.retrieve(&question("anything")).await.unwrap();

    assert!(!bundle.context_available);
    assert!(bundle.ranked_items.is_empty());
    assert!(bundle.citations.is_empty());
}

#[tokio::test]
async fn test_partial_scope_failure_keeps_other_scopes() {
    let inner = InMemoryIndex::new();
    inner.insert(record(
        "mine",
        SourceType::UserMaterial,
        "mat-1",
        Some("u1"),
        "my notes",
        0.9,
    ));
    inner.insert(record(
        "kb",
        SourceType::KnowledgeBase,
        "kb-1",
        None,
        "kb entry",
        0.7,
    ));
    inner.insert(record(
        "gen",
        SourceType::General,
        "g-1",
        None,
        "general entry",
        0.6,
    ));

    let retriever = retriever(Arc::new(FlakyUserScopeIndex { inner }));
    let request = RetrieveRequest {
        owner_id: Some("u1".to_string()),
        ..question("anything")
    };
    let bundle = retriever.retrieve(&request).await.unwrap();

    assert!(bundle.context_available);
    let ids: Vec<&str> = bundle
        .ranked_items
        .iter()
        .map(|r| r.item.id.as_str())
        .collect();
    assert_eq!(ids, vec!["kb", "gen"]);
}

#[tokio::test]
async fn test_empty_index_returns_empty_available_context() {
    let retriever = retriever(Arc::new(InMemoryIndex::new()));
    let bundle = retriever.retrieve(&question("anything")).await.unwrap();

    assert!(bundle.context_available);
    assert!(bundle.ranked_items.is_empty());
    assert!(bundle.citations.is_empty());
}

#[tokio::test]
async fn test_anonymous_query_skips_user_materials_scope() {
    let index = InMemoryIndex::new();
    index.insert(record(
        "mine",
        SourceType::UserMaterial,
        "mat-1",
        Some("u1"),
        "my notes",
        0.99,
    ));
    index.insert(record(
        "kb",
        SourceType::KnowledgeBase,
        "kb-1",
        None,
        "kb entry",
        0.5,
    ));

    let retriever = retriever(Arc::new(index));
    let bundle = retriever.retrieve(&question("anything")).await.unwrap();

    let ids: Vec<&str> = bundle
        .ranked_items
        .iter()
        .map(|r| r.item.id.as_str())
        .collect();
    assert_eq!(ids, vec!["kb"]);
}

#[tokio::test]
async fn test_zero_top_k_is_rejected() {
    let retriever = retriever(Arc::new(InMemoryIndex::new()));
    let request = RetrieveRequest {
        top_k: Some(0),
        ..question("anything")
    };
    let err = retriever.retrieve(&request).await.unwrap_err();
    assert!(matches!(err, RetrievalError::InvalidInput(_)));
}

#[tokio::test]
async fn test_pinned_book_elevates_and_deduplicates_across_scopes() {
    let index = InMemoryIndex::new();
    // The same book chunk is reachable through both the knowledge-base
    // scope (stored tag) and the pinned-book scope (source_id match).
    index.insert(record(
        "bk1",
        SourceType::RecommendedBook,
        "feynman-vol1",
        None,
        "energy conservation lecture",
        0.6,
    ));
    index.insert(record(
        "kb",
        SourceType::KnowledgeBase,
        "kb-1",
        None,
        "energy overview",
        0.8,
    ));

    let retriever = retriever(Arc::new(index));
    let request = RetrieveRequest {
        selected_book_id: Some("feynman-vol1".to_string()),
        ..question("energy conservation")
    };
    let bundle = retriever.retrieve(&request).await.unwrap();

    // One copy of the book chunk survives, carrying the pinned-book tag
    // (0.8 weight), which outranks the knowledge-base entry.
    assert_eq!(bundle.ranked_items.len(), 2);
    assert_eq!(bundle.ranked_items[0].item.id, "bk1");
    assert_eq!(
        bundle.ranked_items[0].item.source_type,
        SourceType::SelectedBook
    );
    assert_eq!(bundle.ranked_items[1].item.id, "kb");
}

#[tokio::test]
async fn test_hanging_scope_times_out_and_degrades() {
    let retriever = Retriever::new(
        Arc::new(StaticEmbedder {
            vector: vec![1.0, 0.0],
        }),
        Arc::new(HangingIndex),
        RetrieverOptions {
            scope_timeout: Duration::from_millis(50),
            ..RetrieverOptions::default()
        },
    );

    let start = std::time::Instant::now();
    let bundle = retriever.retrieve(&question("anything")).await.unwrap();

    assert!(bundle.context_available);
    assert!(bundle.ranked_items.is_empty());
    // All scopes time out concurrently, not sequentially.
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_blank_question_short_circuits_without_embedding() {
    // A failing embedder proves the gateway is never consulted.
    let retriever = Retriever::new(
        Arc::new(FailingEmbedder),
        Arc::new(InMemoryIndex::new()),
        RetrieverOptions::default(),
    );
    let bundle = retriever.retrieve(&question("   ")).await.unwrap();

    assert!(bundle.context_available);
    assert!(bundle.ranked_items.is_empty());
}

#[tokio::test]
async fn test_identical_inputs_yield_identical_ranking() {
    let index = Arc::new(InMemoryIndex::new());
    index.insert(record("a", SourceType::General, "g-1", None, "one", 0.9));
    index.insert(record("b", SourceType::KnowledgeBase, "kb-1", None, "two", 0.7));
    index.insert(record("c", SourceType::General, "g-2", None, "three", 0.7));

    let retriever = retriever(index);
    let first = retriever.retrieve(&question("anything")).await.unwrap();
    let second = retriever.retrieve(&question("anything")).await.unwrap();

    let order = |bundle: &tutor_context_core::models::ContextBundle| {
        bundle
            .ranked_items
            .iter()
            .map(|r| r.item.id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(order(&first), order(&second));
}
