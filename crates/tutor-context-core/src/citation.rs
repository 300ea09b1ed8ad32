//! Citation builder: ranked items → user-facing attribution records.
//!
//! Produces one [`Citation`] per unique `source_id`, in order of each
//! source's first (best-ranked) occurrence. Pure transformation — no
//! network or I/O.

use std::collections::HashSet;

use chrono::Utc;

use crate::models::{Citation, RankedItem};

/// Clamp to `[0, 1]` and round to two decimals for display.
///
/// Internal ranking always uses the unrounded combined score; only the
/// citation's `confidence` field is rounded.
fn display_confidence(combined_score: f64) -> f64 {
    (combined_score.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// Page/chapter locator from item metadata, if present.
fn locator(item: &RankedItem) -> Option<String> {
    if let Some(page) = item.item.metadata_display("page") {
        return Some(format!("page {}", page));
    }
    item.item
        .metadata_display("chapter")
        .map(|chapter| format!("chapter {}", chapter))
}

/// Build citations for a ranked list.
///
/// Multiple chunks from the same source collapse into a single citation;
/// because the input is best-first, the surviving citation carries the
/// source's best confidence and locator.
pub fn build_citations(ranked_items: &[RankedItem]) -> Vec<Citation> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut citations: Vec<Citation> = Vec::new();

    for ranked in ranked_items {
        if !seen.insert(ranked.item.source_id.as_str()) {
            continue;
        }
        let title = ranked
            .item
            .metadata_display("title")
            .unwrap_or_else(|| ranked.item.source_id.clone());
        citations.push(Citation {
            source_id: ranked.item.source_id.clone(),
            title,
            author: ranked.item.metadata_display("author"),
            confidence: display_confidence(ranked.combined_score),
            locator: locator(ranked),
            created_at: Utc::now(),
        });
    }

    citations
}
