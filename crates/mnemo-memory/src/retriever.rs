// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid merge of keyword and vector hits.

use std::collections::HashMap;

use crate::types::{MemorySource, RawHit, SNIPPET_MAX_CHARS, SearchResult, SearchSettings, truncate_chars};

/// Scales every score by the largest one in the set, so the top hit is 1.0.
///
/// A set whose maximum is not positive is left unscaled.
fn normalize(hits: &mut [RawHit]) {
    let max = hits.iter().map(|h| h.score).fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        for hit in hits.iter_mut() {
            hit.score /= max;
        }
    }
}

/// Merges keyword and vector hits into one ranked list.
///
/// Each set is normalized on its own. Keyword scores are weighted by
/// `keyword_weight`, or by 1.0 when there are no vector hits at all; vector
/// scores are always weighted by `vector_weight`. Hits for the same
/// `path:start_line` are summed. The result is filtered by `min_score`,
/// sorted best-first and cut to `max_results`.
pub fn merge_hybrid_results(
    mut keyword: Vec<RawHit>,
    mut vector: Vec<RawHit>,
    settings: &SearchSettings,
) -> Vec<SearchResult> {
    normalize(&mut keyword);
    normalize(&mut vector);

    let keyword_weight = if vector.is_empty() {
        1.0
    } else {
        settings.keyword_weight
    };

    // Insertion order breaks score ties deterministically.
    let mut order: Vec<String> = Vec::new();
    let mut merged: HashMap<String, (RawHit, f64)> = HashMap::new();

    let weighted = keyword
        .into_iter()
        .map(|h| (h, keyword_weight))
        .chain(vector.into_iter().map(|h| (h, settings.vector_weight)));

    for (hit, weight) in weighted {
        let key = format!("{}:{}", hit.path, hit.start_line);
        let score = hit.score * weight;
        match merged.get_mut(&key) {
            Some((_, total)) => *total += score,
            None => {
                order.push(key.clone());
                merged.insert(key, (hit, score));
            }
        }
    }

    let mut results: Vec<SearchResult> = order
        .into_iter()
        .filter_map(|key| merged.remove(&key))
        .filter(|(_, score)| *score >= settings.min_score)
        .map(|(hit, score)| SearchResult {
            source: MemorySource::from_path(&hit.path),
            snippet: truncate_chars(&hit.text, SNIPPET_MAX_CHARS).to_string(),
            path: hit.path,
            start_line: hit.start_line,
            end_line: hit.end_line,
            score,
        })
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(settings.max_results);
    results
}
