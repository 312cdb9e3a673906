use index::ChunkIndex;
use ingest::Chunk;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
    /// 1-based position in the ranked list.
    pub rank: usize,
    /// Insertion position in the index; the tie-breaker.
    pub position: usize,
}

/// Floor filter + stable top-K over precomputed similarities.
#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    relevance_floor: f32,
}

impl Ranker {
    pub fn new(relevance_floor: f32) -> Self {
        Self { relevance_floor }
    }

    pub fn relevance_floor(&self) -> f32 {
        self.relevance_floor
    }

    /// `scores[i]` is the similarity of chunk `i` of `index`.
    ///
    /// Returns at most `k` chunks scoring strictly above the floor, highest
    /// first; equal scores keep index order.
    pub fn rank(&self, index: &ChunkIndex, scores: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut survivors: Vec<(usize, f32)> = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, score)| score > self.relevance_floor)
            .collect();

        // sort_by is stable, so ties stay in insertion order
        survivors.sort_by(|a, b| b.1.total_cmp(&a.1));

        survivors
            .into_iter()
            .take(k)
            .filter_map(|(position, score)| {
                index.get(position).map(|chunk| (position, score, chunk.clone()))
            })
            .enumerate()
            .map(|(i, (position, score, chunk))| ScoredChunk {
                chunk,
                score,
                rank: i + 1,
                position,
            })
            .collect()
    }
}
