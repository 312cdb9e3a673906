use std::collections::HashSet;

use async_trait::async_trait;

use crate::{ChunkIndex, Embedder, EmbedderKind};

/// Lowercase, split on whitespace, and trim punctuation from both ends of
/// each token. Interior punctuation survives ("500-1000", "mg/kgbb").
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// |A ∩ B| / |A ∪ B|, or 0 when either side is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}

/// Set-overlap fallback. Always available, scores bounded in [0, 1].
pub struct LexicalEmbedder {
    chunk_tokens: Vec<HashSet<String>>,
}

impl LexicalEmbedder {
    pub fn new(index: &ChunkIndex) -> Self {
        Self {
            chunk_tokens: index.iter().map(|c| tokenize(&c.content)).collect(),
        }
    }

    pub fn score(&self, query: &str) -> Vec<f32> {
        let query_tokens = tokenize(query);
        self.chunk_tokens
            .iter()
            .map(|tokens| jaccard(&query_tokens, tokens))
            .collect()
    }
}

#[async_trait]
impl Embedder for LexicalEmbedder {
    fn kind(&self) -> EmbedderKind {
        EmbedderKind::Lexical
    }

    async fn similarities(&self, query: &str) -> anyhow::Result<Vec<f32>> {
        Ok(self.score(query))
    }
}
