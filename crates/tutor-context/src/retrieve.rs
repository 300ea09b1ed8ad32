//! Retrieval orchestrator: embed → scoped fan-out → rank → cite.
//!
//! [`Retriever`] is the single entry point the response generator calls.
//! It owns shared gateway handles and coordinates one atomic retrieval per
//! question:
//!
//! 1. Embed the question.
//! 2. Fan out up to three scoped vector searches concurrently, each with a
//!    bounded timeout: the user's own materials, the pinned book, and the
//!    shared knowledge base.
//! 3. Merge the candidates, rank them with the source prioritizer, and
//!    build citations.
//!
//! # Degradation
//!
//! Embedding failure returns an empty bundle with `context_available =
//! false` — never an error. A single scope failing or timing out is logged
//! and treated as zero results for that scope; the other scopes still
//! contribute. Only structurally invalid arguments (`top_k == 0`,
//! out-of-range ranking weights) surface as errors.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use tutor_context_core::citation::build_citations;
use tutor_context_core::error::{Result, RetrievalError};
use tutor_context_core::gateway::{Embedder, ScopeFilter, VectorSearch};
use tutor_context_core::models::{ContentItem, ContextBundle, SourceType};
use tutor_context_core::rank::{prioritize, RankingParams};

use crate::config::Config;

/// One retrieval request.
#[derive(Debug, Clone, Default)]
pub struct RetrieveRequest {
    /// The user's question.
    pub question: String,
    /// Requesting user; scopes the user-materials search. `None` skips
    /// that scope entirely (anonymous query).
    pub owner_id: Option<String>,
    /// Book the user pinned as their preferred reference, if any.
    pub selected_book_id: Option<String>,
    /// Per-request override of the configured `top_k`.
    pub top_k: Option<usize>,
}

/// Orchestrator tuning, decoupled from application config.
#[derive(Debug, Clone)]
pub struct RetrieverOptions {
    /// Final result count bound.
    pub top_k: usize,
    /// Candidates fetched per scope before merging.
    pub candidate_k: usize,
    /// Per-scope search timeout.
    pub scope_timeout: Duration,
    /// Scoring parameters for the prioritizer.
    pub ranking: RankingParams,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            candidate_k: 20,
            scope_timeout: Duration::from_secs(10),
            ranking: RankingParams::default(),
        }
    }
}

impl RetrieverOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            candidate_k: config.retrieval.candidate_k,
            scope_timeout: config.retrieval.scope_timeout(),
            ranking: config.retrieval.ranking_params(),
        }
    }
}

/// The retrieval pipeline entry point.
///
/// Holds long-lived gateway handles injected at construction; the struct
/// itself is stateless between calls and safe to share behind an `Arc`
/// across concurrent requests.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorSearch>,
    options: RetrieverOptions,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorSearch>,
        options: RetrieverOptions,
    ) -> Self {
        Self {
            embedder,
            index,
            options,
        }
    }

    /// Retrieve the context bundle for one question.
    ///
    /// # Errors
    ///
    /// Only [`RetrievalError::InvalidInput`]. Environmental failures
    /// (embedding provider down, a scope erroring or timing out) degrade
    /// per the module documentation instead of erroring.
    pub async fn retrieve(&self, request: &RetrieveRequest) -> Result<ContextBundle> {
        let top_k = request.top_k.unwrap_or(self.options.top_k);
        if top_k == 0 {
            return Err(RetrievalError::InvalidInput(
                "top_k must be >= 1".to_string(),
            ));
        }
        self.options.ranking.validate()?;

        if request.question.trim().is_empty() {
            return Ok(ContextBundle::available(Vec::new(), Vec::new()));
        }

        let vector = match self.embedder.embed(&request.question).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, "query embedding unavailable; returning empty context");
                return Ok(ContextBundle::unavailable());
            }
        };

        let user_filter = request
            .owner_id
            .as_deref()
            .map(ScopeFilter::user_materials);
        let book_filter = request.selected_book_id.as_deref().map(ScopeFilter::book);

        // The three scopes are independent reads; issue them concurrently
        // and join before merging. Merge order (user, book, knowledge base)
        // fixes the insertion order used for tie-breaking.
        let (user_items, book_items, kb_items) = tokio::join!(
            self.search_scope("user_materials", &vector, user_filter, Some(SourceType::UserMaterial)),
            self.search_scope("selected_book", &vector, book_filter, Some(SourceType::SelectedBook)),
            self.search_scope(
                "knowledge_base",
                &vector,
                Some(ScopeFilter::knowledge_base()),
                None,
            ),
        );

        let mut candidates: Vec<ContentItem> = Vec::new();
        candidates.extend(user_items);
        candidates.extend(book_items);
        candidates.extend(kb_items);

        let ranked_items = prioritize(candidates, top_k, &self.options.ranking)?;
        let citations = build_citations(&ranked_items);

        Ok(ContextBundle::available(ranked_items, citations))
    }

    /// Run one scoped search with a bounded timeout.
    ///
    /// `None` filter means the scope does not apply to this request. When
    /// `retag` is set, returned items are stamped with that source type:
    /// the scope, not the stored tag, is what makes a chunk a user material
    /// or a pinned book.
    async fn search_scope(
        &self,
        scope: &str,
        vector: &[f32],
        filter: Option<ScopeFilter>,
        retag: Option<SourceType>,
    ) -> Vec<ContentItem> {
        let Some(filter) = filter else {
            return Vec::new();
        };

        let search = self.index.search(vector, &filter, self.options.candidate_k);
        match tokio::time::timeout(self.options.scope_timeout, search).await {
            Ok(Ok(mut items)) => {
                if let Some(tag) = retag {
                    for item in &mut items {
                        item.source_type = tag;
                    }
                }
                debug!(scope, count = items.len(), "scope search complete");
                items
            }
            Ok(Err(e)) => {
                warn!(scope, error = %e, "scoped search failed; treating scope as empty");
                Vec::new()
            }
            Err(_) => {
                warn!(scope, "scoped search timed out; treating scope as empty");
                Vec::new()
            }
        }
    }
}

/// CLI entry point — runs one retrieval and prints the bundle to stdout.
pub async fn run_retrieve(
    retriever: &Retriever,
    request: &RetrieveRequest,
    explain: bool,
) -> Result<()> {
    let bundle = retriever.retrieve(request).await?;

    if !bundle.context_available {
        println!("No context available (embedding provider unreachable).");
        return Ok(());
    }
    if bundle.ranked_items.is_empty() {
        println!("No matching context.");
        return Ok(());
    }

    println!("Context ({} items):", bundle.ranked_items.len());
    for ranked in &bundle.ranked_items {
        println!(
            "{}. [{:.2}] {} / {}",
            ranked.rank,
            ranked.combined_score,
            ranked.item.source_type,
            ranked.item.source_id
        );
        if explain {
            println!(
                "    scoring: priority={:.2}  similarity={:.3}  → combined={:.3}",
                ranked.priority_weight, ranked.item.similarity_score, ranked.combined_score
            );
        }
        println!(
            "    excerpt: \"{}\"",
            truncate(&ranked.item.text.replace('\n', " "), 240).trim()
        );
    }

    println!();
    println!("Citations:");
    for citation in &bundle.citations {
        let author = citation
            .author
            .as_deref()
            .map(|a| format!(", {}", a))
            .unwrap_or_default();
        let locator = citation
            .locator
            .as_deref()
            .map(|l| format!(" ({})", l))
            .unwrap_or_default();
        println!(
            "  - {}{}{} — confidence {:.2}",
            citation.title, author, locator, citation.confidence
        );
    }

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
