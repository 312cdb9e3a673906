pub mod cache;
pub mod config;
pub mod dense;
pub mod embeddings;
pub mod lexical;
pub mod selector;

pub use cache::EmbeddingCache;
pub use config::EmbeddingConfig;
pub use dense::{DenseEmbedder, EmbeddingUnavailable, cosine_similarity};
pub use embeddings::EmbeddingClient;
pub use lexical::{LexicalEmbedder, jaccard, tokenize};
pub use selector::{EmbedderSelector, Scores};

use async_trait::async_trait;
use ingest::{Catalog, Chunk};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    Dense,
    Lexical,
}

/// One similarity capability, two interchangeable back-ends.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn kind(&self) -> EmbedderKind;

    /// Similarity of `query` against every chunk of the index the embedder
    /// was built over, in index order.
    async fn similarities(&self, query: &str) -> anyhow::Result<Vec<f32>>;
}

/// All chunks of all entries, in catalog order. Never mutated after build.
#[derive(Debug, Clone, Default)]
pub struct ChunkIndex {
    chunks: Vec<Chunk>,
}

impl ChunkIndex {
    pub fn build(catalog: &Catalog) -> Self {
        Self::from_chunks(ingest::chunk_catalog(catalog))
    }

    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    pub fn get(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of distinct entries represented in the index.
    pub fn entry_count(&self) -> usize {
        let mut ids: Vec<&str> = self.chunks.iter().map(|c| c.entry_id.as_str()).collect();
        ids.dedup();
        ids.len()
    }
}
