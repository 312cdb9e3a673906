use anyhow::Context;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::EmbeddingCache;
use crate::embeddings::EmbeddingClient;
use crate::{ChunkIndex, Embedder, EmbedderKind};

#[derive(Debug, Error)]
#[error("dense embedder unavailable: {0}")]
pub struct EmbeddingUnavailable(pub String);

/// Semantic encoder backed by an embedding service. Chunk vectors are
/// computed once at initialization; only queries hit the service afterwards.
pub struct DenseEmbedder {
    client: EmbeddingClient,
    chunk_vectors: Vec<Vec<f32>>,
    dimension: usize,
    cache: EmbeddingCache,
}

impl DenseEmbedder {
    /// Probe the service and embed every chunk. Any failure means the dense
    /// variant cannot be used.
    pub async fn initialize(
        client: EmbeddingClient,
        index: &ChunkIndex,
        cache_entries: usize,
    ) -> Result<Self, EmbeddingUnavailable> {
        let unavailable = |e: anyhow::Error| EmbeddingUnavailable(format!("{:#}", e));

        let dimension = client.get_dimension().await.map_err(unavailable)?;
        if dimension == 0 {
            return Err(EmbeddingUnavailable("embedding dimension is zero".to_string()));
        }

        let mut chunk_vectors = Vec::with_capacity(index.len());
        for chunk in index.iter() {
            let vector = client
                .embed(&chunk.content)
                .await
                .with_context(|| format!("Failed to embed chunk {}", chunk.chunk_id))
                .map_err(unavailable)?;
            if vector.len() != dimension {
                return Err(EmbeddingUnavailable(format!(
                    "chunk {} has dimension {}, expected {}",
                    chunk.chunk_id,
                    vector.len(),
                    dimension
                )));
            }
            chunk_vectors.push(vector);
        }

        info!(
            model = client.model(),
            dimension,
            chunks = chunk_vectors.len(),
            "Dense embedder initialized"
        );

        Ok(Self {
            client,
            chunk_vectors,
            dimension,
            cache: EmbeddingCache::new(cache_entries),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_query(&self, query: &str) -> anyhow::Result<Vec<f32>> {
        if let Some(vector) = self.cache.get(query) {
            debug!("Query embedding served from cache");
            return Ok(vector);
        }

        let vector = self.client.embed(query).await?;
        if vector.len() != self.dimension {
            anyhow::bail!(
                "Query embedding has dimension {}, expected {}",
                vector.len(),
                self.dimension
            );
        }
        self.cache.insert(query, vector.clone());
        Ok(vector)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[async_trait]
impl Embedder for DenseEmbedder {
    fn kind(&self) -> EmbedderKind {
        EmbedderKind::Dense
    }

    async fn similarities(&self, query: &str) -> anyhow::Result<Vec<f32>> {
        let query_vector = self.embed_query(query).await?;
        Ok(self
            .chunk_vectors
            .iter()
            .map(|v| cosine_similarity(&query_vector, v))
            .collect())
    }
}
