//! Source prioritizer: trust-weighted scoring, deduplication, top-K selection.
//!
//! Given the merged candidates from all scoped searches, this module produces
//! the final ranked list. It is a pure function of its inputs — no gateway
//! calls, no suspension points.
//!
//! # Ranking Algorithm
//!
//! 1. Reject items with a non-finite similarity score; clamp the rest to `[0, 1]`.
//! 2. Drop items whose similarity is below `min_score`.
//! 3. Score: `combined = α × priority_weight + (1-α) × similarity`.
//! 4. Stable sort by combined score (desc), then priority weight (desc),
//!    then original insertion order.
//! 5. Deduplicate by (`source_id`, normalized-text hash); the first survivor
//!    per key — i.e. the highest-scoring one — wins.
//! 6. Truncate to `top_k` and assign 1-based ranks.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::error::{RetrievalError, Result};
use crate::models::{ContentItem, RankedItem};

/// Ranking tuning parameters, decoupled from application config.
#[derive(Debug, Clone)]
pub struct RankingParams {
    /// Weight of source trust vs semantic similarity:
    /// `combined = α × priority + (1-α) × similarity`.
    pub source_alpha: f64,
    /// Similarity floor; candidates below it are dropped before ranking.
    pub min_score: f64,
}

impl Default for RankingParams {
    fn default() -> Self {
        Self {
            // Source trust dominates raw similarity: the user chose these
            // materials. Similarity still differentiates within a tier.
            source_alpha: 0.6,
            min_score: 0.0,
        }
    }
}

impl RankingParams {
    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.source_alpha) {
            return Err(RetrievalError::InvalidInput(format!(
                "source_alpha must be in [0.0, 1.0], got {}",
                self.source_alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(RetrievalError::InvalidInput(format!(
                "min_score must be in [0.0, 1.0], got {}",
                self.min_score
            )));
        }
        Ok(())
    }
}

/// Normalize text for duplicate detection: lowercase, collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// SHA-256 hash of the normalized text, as lowercase hex.
fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_text(text).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Rank candidates into a deduplicated, size-bounded list.
///
/// Returns at most `top_k` items sorted descending by combined score.
/// An empty candidate list yields an empty result, not an error.
///
/// # Errors
///
/// [`RetrievalError::InvalidInput`] when `top_k` is zero or `params` is out
/// of range — both indicate a caller bug, not a transient condition.
pub fn prioritize(
    candidates: Vec<ContentItem>,
    top_k: usize,
    params: &RankingParams,
) -> Result<Vec<RankedItem>> {
    if top_k == 0 {
        return Err(RetrievalError::InvalidInput(
            "top_k must be >= 1".to_string(),
        ));
    }
    params.validate()?;

    struct Scored {
        priority_weight: f64,
        combined_score: f64,
        item: ContentItem,
    }

    let mut scored: Vec<Scored> = Vec::with_capacity(candidates.len());
    for mut item in candidates {
        // Items must arrive scored; a NaN/infinite score means the backend
        // violated its contract, so the item is rejected rather than ranked.
        if !item.similarity_score.is_finite() {
            continue;
        }
        item.similarity_score = item.similarity_score.clamp(0.0, 1.0);
        if item.similarity_score < params.min_score {
            continue;
        }

        let priority_weight = item.source_type.priority_weight();
        let combined_score = params.source_alpha * priority_weight
            + (1.0 - params.source_alpha) * item.similarity_score;
        scored.push(Scored {
            priority_weight,
            combined_score,
            item,
        });
    }

    // Stable sort, so full ties keep their insertion order.
    scored.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.priority_weight
                    .partial_cmp(&a.priority_weight)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    // The list is best-first, so keeping the first occurrence per key keeps
    // the highest-scoring duplicate.
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut ranked: Vec<RankedItem> = Vec::new();
    for s in scored {
        let key = (s.item.source_id.clone(), content_hash(&s.item.text));
        if !seen.insert(key) {
            continue;
        }
        let rank = ranked.len() + 1;
        ranked.push(RankedItem {
            item: s.item,
            priority_weight: s.priority_weight,
            combined_score: s.combined_score,
            rank,
        });
        if ranked.len() == top_k {
            break;
        }
    }

    Ok(ranked)
}
