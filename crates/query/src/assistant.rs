use std::sync::Arc;
use std::time::Instant;

use index::{ChunkIndex, Embedder, EmbedderKind, EmbedderSelector};
use ingest::{Catalog, FacetType};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregator::{self, SelectionResult};
use crate::config::{AssistantConfig, RetrievalConfig};
use crate::context::ContextAssembler;
use crate::error::QueryError;
use crate::generator::{AnswerSource, GeneratorAdapter};
use crate::ranker::{Ranker, ScoredChunk};
use crate::session::SessionMemory;

pub const NO_INFORMATION_MESSAGE: &str =
    "Maaf, tidak ditemukan informasi yang relevan di katalog obat untuk pertanyaan Anda.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub answer: String,
    pub source: AnswerSource,
    pub entry_id: Option<String>,
    pub entry_name: Option<String>,
    pub sources: Vec<SourceRef>,
    pub trace: RetrievalTrace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub chunk_id: String,
    pub entry_id: String,
    pub facet_type: FacetType,
    pub content: String,
    pub relevance_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalTrace {
    pub embedder: EmbedderKind,
    pub chunks_scored: usize,
    pub chunks_retrieved: usize,
    pub context_size: usize,
    pub elapsed_ms: u128,
}

/// Everything retrieval produced for one query, ready for generation.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub ranked: Vec<ScoredChunk>,
    pub selection: SelectionResult,
    pub context: String,
    pub embedder: EmbedderKind,
}

/// The full question-answering pipeline over one catalog.
///
/// Catalog, index and embedder are built once and only read afterwards, so
/// one `Assistant` can serve concurrent requests behind an `Arc`.
pub struct Assistant {
    catalog: Arc<Catalog>,
    index: Arc<ChunkIndex>,
    embedder: EmbedderSelector,
    ranker: Ranker,
    assembler: ContextAssembler,
    generator: GeneratorAdapter,
    config: RetrievalConfig,
}

impl Assistant {
    pub fn bootstrap(catalog: Catalog, config: AssistantConfig) -> Result<Self, QueryError> {
        config.validate()?;
        if catalog.is_empty() {
            return Err(QueryError::invalid("catalog has no records"));
        }

        let catalog = Arc::new(catalog);
        let index = Arc::new(ChunkIndex::build(&catalog));
        let embedder = EmbedderSelector::new(index.clone(), config.embedding.clone());
        let generator = GeneratorAdapter::from_config(&config.generator)?;

        info!(
            entries = catalog.len(),
            chunks = index.len(),
            "Assistant bootstrapped"
        );

        Ok(Self {
            catalog,
            index,
            embedder,
            ranker: Ranker::new(config.retrieval.relevance_floor),
            assembler: ContextAssembler::new(config.retrieval.facet_order.clone()),
            generator,
            config: config.retrieval,
        })
    }

    /// Replace the generator adapter (e.g. with a custom primary generator).
    pub fn with_generator(mut self, generator: GeneratorAdapter) -> Self {
        self.generator = generator;
        self
    }

    /// Use `embedder` instead of probing for one.
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = EmbedderSelector::with_embedder(self.index.clone(), embedder);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &ChunkIndex {
        &self.index
    }

    pub fn embedder_kind(&self) -> Option<EmbedderKind> {
        self.embedder.active_kind()
    }

    pub fn generator_configured(&self) -> bool {
        self.generator.has_primary()
    }

    pub fn retrieval_config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Top `k` chunks above the relevance floor, highest score first.
    pub async fn rank(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, QueryError> {
        let k = self.config.resolve_top_k(Some(k))?;
        let (_, ranked) = self.score_and_rank(query, k).await;
        Ok(ranked)
    }

    /// Rank, select the best entry, and assemble its context.
    ///
    /// `Err(EmptyRetrieval)` when nothing clears the relevance floor.
    pub async fn retrieve_information(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Retrieval, QueryError> {
        let k = self.config.resolve_top_k(top_k)?;
        let (embedder, ranked) = self.score_and_rank(query, k).await;

        let selection = aggregator::select(&ranked, &self.catalog).ok_or(QueryError::EmptyRetrieval)?;
        let context = self.assembler.assemble(&selection);

        debug!(
            entry_id = %selection.best_entry_id,
            chunks = ranked.len(),
            context_size = context.len(),
            "Retrieved context"
        );

        Ok(Retrieval {
            ranked,
            selection,
            context,
            embedder,
        })
    }

    /// Answer `question`. Only malformed requests are errors; an empty
    /// retrieval is answered with [`NO_INFORMATION_MESSAGE`] without calling
    /// the generator.
    pub async fn ask(
        &self,
        question: &str,
        session: &mut SessionMemory,
        top_k: Option<usize>,
    ) -> Result<AssistantResponse, QueryError> {
        let start = Instant::now();
        if question.trim().is_empty() {
            return Err(QueryError::invalid("question must not be empty"));
        }

        let retrieval = match self.retrieve_information(question, top_k).await {
            Ok(retrieval) => retrieval,
            Err(QueryError::EmptyRetrieval) => {
                info!("No chunk cleared the relevance floor");
                return Ok(AssistantResponse {
                    answer: NO_INFORMATION_MESSAGE.to_string(),
                    source: AnswerSource::NoInformation,
                    entry_id: None,
                    entry_name: None,
                    sources: Vec::new(),
                    trace: RetrievalTrace {
                        embedder: self.embedder_kind().unwrap_or(EmbedderKind::Lexical),
                        chunks_scored: self.index.len(),
                        chunks_retrieved: 0,
                        context_size: 0,
                        elapsed_ms: start.elapsed().as_millis(),
                    },
                });
            }
            Err(e) => return Err(e),
        };

        let record = &retrieval.selection.best_record;
        let generated = self
            .generator
            .answer(question, &retrieval.context, record)
            .await;

        session.record(&record.entry_id, &record.name);

        let sources = retrieval
            .ranked
            .iter()
            .map(|scored| SourceRef {
                chunk_id: scored.chunk.chunk_id.clone(),
                entry_id: scored.chunk.entry_id.clone(),
                facet_type: scored.chunk.facet_type,
                content: scored.chunk.content.clone(),
                relevance_score: scored.score,
            })
            .collect();

        info!(
            entry_id = %record.entry_id,
            source = ?generated.source,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Answered question"
        );

        Ok(AssistantResponse {
            answer: generated.text,
            source: generated.source,
            entry_id: Some(record.entry_id.clone()),
            entry_name: Some(record.name.clone()),
            sources,
            trace: RetrievalTrace {
                embedder: retrieval.embedder,
                chunks_scored: self.index.len(),
                chunks_retrieved: retrieval.ranked.len(),
                context_size: retrieval.context.len(),
                elapsed_ms: start.elapsed().as_millis(),
            },
        })
    }

    async fn score_and_rank(&self, query: &str, k: usize) -> (EmbedderKind, Vec<ScoredChunk>) {
        let scores = self.embedder.score(query).await;
        let ranked = self.ranker.rank(&self.index, &scores.values, k);
        (scores.kind, ranked)
    }
}
