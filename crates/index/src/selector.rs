use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::EmbeddingConfig;
use crate::dense::DenseEmbedder;
use crate::embeddings::EmbeddingClient;
use crate::lexical::LexicalEmbedder;
use crate::{ChunkIndex, Embedder, EmbedderKind};

/// Similarities of one query against the whole index, all produced by the
/// same embedder variant.
#[derive(Debug, Clone)]
pub struct Scores {
    pub kind: EmbedderKind,
    pub values: Vec<f32>,
}

/// Lazily picks the embedder variant on first use and keeps that choice for
/// the life of the process.
pub struct EmbedderSelector {
    index: Arc<ChunkIndex>,
    config: EmbeddingConfig,
    lexical: Arc<LexicalEmbedder>,
    active: OnceCell<Arc<dyn Embedder>>,
}

impl EmbedderSelector {
    pub fn new(index: Arc<ChunkIndex>, config: EmbeddingConfig) -> Self {
        let lexical = Arc::new(LexicalEmbedder::new(&index));
        Self {
            index,
            config,
            lexical,
            active: OnceCell::new(),
        }
    }

    /// Selector whose choice is already made.
    pub fn with_embedder(index: Arc<ChunkIndex>, embedder: Arc<dyn Embedder>) -> Self {
        let lexical = Arc::new(LexicalEmbedder::new(&index));
        Self {
            index,
            config: EmbeddingConfig::lexical_only(),
            lexical,
            active: OnceCell::new_with(Some(embedder)),
        }
    }

    /// The active embedder, initializing it on the first call. Concurrent
    /// first callers wait on the same initialization.
    pub async fn active(&self) -> Arc<dyn Embedder> {
        self.active
            .get_or_init(|| self.select())
            .await
            .clone()
    }

    /// Kind of the active embedder, without triggering initialization.
    pub fn active_kind(&self) -> Option<EmbedderKind> {
        self.active.get().map(|e| e.kind())
    }

    /// Score `query` against every chunk in index order.
    ///
    /// If the dense variant fails for this query, the whole query is scored
    /// lexically instead; variants are never mixed within one result.
    pub async fn score(&self, query: &str) -> Scores {
        let embedder = self.active().await;
        match embedder.similarities(query).await {
            Ok(values) if values.len() == self.index.len() => Scores {
                kind: embedder.kind(),
                values,
            },
            Ok(values) => {
                warn!(
                    expected = self.index.len(),
                    got = values.len(),
                    "Embedder returned misaligned scores, scoring lexically"
                );
                self.lexical_scores(query)
            }
            Err(e) => {
                warn!(error = %e, "Query embedding failed, scoring lexically");
                self.lexical_scores(query)
            }
        }
    }

    fn lexical_scores(&self, query: &str) -> Scores {
        Scores {
            kind: EmbedderKind::Lexical,
            values: self.lexical.score(query),
        }
    }

    async fn select(&self) -> Arc<dyn Embedder> {
        if !self.config.enabled {
            info!("Dense embedder disabled, using lexical similarity");
            return self.lexical.clone();
        }

        let client = match EmbeddingClient::from_config(&self.config) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Falling back to lexical similarity");
                return self.lexical.clone();
            }
        };

        match DenseEmbedder::initialize(client, &self.index, self.config.cache_entries).await {
            Ok(dense) => Arc::new(dense),
            Err(e) => {
                warn!(error = %e, "Falling back to lexical similarity");
                self.lexical.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ingest::Catalog;

    struct BrokenDense;

    #[async_trait]
    impl Embedder for BrokenDense {
        fn kind(&self) -> EmbedderKind {
            EmbedderKind::Dense
        }

        async fn similarities(&self, _query: &str) -> anyhow::Result<Vec<f32>> {
            anyhow::bail!("connection reset")
        }
    }

    fn builtin_index() -> Arc<ChunkIndex> {
        Arc::new(ChunkIndex::build(&Catalog::builtin().unwrap()))
    }

    #[tokio::test]
    async fn test_disabled_dense_selects_lexical() {
        let selector = EmbedderSelector::new(builtin_index(), EmbeddingConfig::lexical_only());
        assert_eq!(selector.active_kind(), None);

        let scores = selector.score("sakit kepala").await;
        assert_eq!(scores.kind, EmbedderKind::Lexical);
        assert_eq!(selector.active_kind(), Some(EmbedderKind::Lexical));
    }

    #[tokio::test]
    async fn test_unreachable_service_selects_lexical() {
        let config = EmbeddingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..EmbeddingConfig::default()
        };
        let selector = EmbedderSelector::new(builtin_index(), config);

        assert_eq!(selector.active().await.kind(), EmbedderKind::Lexical);
        // The choice sticks
        assert_eq!(selector.score("demam").await.kind, EmbedderKind::Lexical);
    }

    #[tokio::test]
    async fn test_runtime_dense_failure_scores_whole_query_lexically() {
        let index = builtin_index();
        let selector = EmbedderSelector::with_embedder(index.clone(), Arc::new(BrokenDense));

        let scores = selector.score("sakit kepala").await;
        assert_eq!(scores.kind, EmbedderKind::Lexical);
        assert_eq!(scores.values, LexicalEmbedder::new(&index).score("sakit kepala"));
        assert_eq!(selector.active_kind(), Some(EmbedderKind::Dense));
    }
}
