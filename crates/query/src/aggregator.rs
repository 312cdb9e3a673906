use std::collections::BTreeMap;

use ingest::{Catalog, DrugRecord, FacetType};
use serde::Serialize;
use tracing::warn;

use crate::ranker::ScoredChunk;

#[derive(Debug, Clone, Serialize)]
pub struct SelectionResult {
    pub best_entry_id: String,
    pub best_record: DrugRecord,
    /// Ranked chunks grouped by facet, ranked order preserved in each group.
    pub per_facet_chunks: BTreeMap<FacetType, Vec<ScoredChunk>>,
    /// Summed score per entry, in order of first appearance.
    pub entry_scores: Vec<(String, f32)>,
}

/// Sum chunk scores per entry and pick the highest total. Ties go to the
/// entry that appears first in `ranked`.
///
/// Returns `None` when `ranked` is empty or the winner is not in `catalog`.
pub fn select(ranked: &[ScoredChunk], catalog: &Catalog) -> Option<SelectionResult> {
    let mut entry_scores: Vec<(String, f32)> = Vec::new();
    for scored in ranked {
        match entry_scores
            .iter_mut()
            .find(|(id, _)| *id == scored.chunk.entry_id)
        {
            Some((_, total)) => *total += scored.score,
            None => entry_scores.push((scored.chunk.entry_id.clone(), scored.score)),
        }
    }

    let mut best: Option<&(String, f32)> = None;
    for candidate in &entry_scores {
        // Strictly greater: the earlier entry keeps a tie
        if best.is_none_or(|(_, top)| candidate.1 > *top) {
            best = Some(candidate);
        }
    }
    let (best_entry_id, _) = best?;

    let Some(best_record) = catalog.get(best_entry_id) else {
        warn!(entry_id = %best_entry_id, "Ranked entry is missing from the catalog");
        return None;
    };

    let mut per_facet_chunks: BTreeMap<FacetType, Vec<ScoredChunk>> = BTreeMap::new();
    for scored in ranked {
        per_facet_chunks
            .entry(scored.chunk.facet_type)
            .or_default()
            .push(scored.clone());
    }

    Some(SelectionResult {
        best_entry_id: best_entry_id.clone(),
        best_record: best_record.clone(),
        per_facet_chunks,
        entry_scores: entry_scores.clone(),
    })
}
