use ingest::FacetType;
use index::EmbeddingConfig;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Callers may never ask for more chunks than this.
pub const TOP_K_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks must score strictly above this to be retrieved.
    pub relevance_floor: f32,
    pub top_k: usize,
    pub max_top_k: usize,
    pub facet_order: Vec<FacetType>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            relevance_floor: 0.1,
            top_k: 3,
            max_top_k: TOP_K_LIMIT,
            facet_order: FacetType::ALL.to_vec(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), QueryError> {
        if !(0.0..1.0).contains(&self.relevance_floor) {
            return Err(QueryError::invalid(format!(
                "relevance_floor must be in [0, 1), got {}",
                self.relevance_floor
            )));
        }
        if self.max_top_k == 0 || self.max_top_k > TOP_K_LIMIT {
            return Err(QueryError::invalid(format!(
                "max_top_k must be in 1..={}, got {}",
                TOP_K_LIMIT, self.max_top_k
            )));
        }
        self.resolve_top_k(Some(self.top_k))?;

        if self.facet_order.is_empty() {
            return Err(QueryError::invalid("facet_order must not be empty"));
        }
        for (i, facet) in self.facet_order.iter().enumerate() {
            if self.facet_order[..i].contains(facet) {
                return Err(QueryError::invalid(format!("facet '{}' listed twice", facet)));
            }
        }
        Ok(())
    }

    /// Per-request K: the configured default, or the caller's value if it
    /// is within bounds.
    pub fn resolve_top_k(&self, requested: Option<usize>) -> Result<usize, QueryError> {
        let k = requested.unwrap_or(self.top_k);
        if k == 0 || k > self.max_top_k {
            return Err(QueryError::invalid(format!(
                "top_k must be in 1..={}, got {}",
                self.max_top_k, k
            )));
        }
        Ok(k)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            api_key: None,
            temperature: 0.1,
            top_p: 0.8,
            max_tokens: 800,
            timeout_secs: 60,
            max_retries: 1,
            initial_backoff_ms: 500,
            max_backoff_ms: 5000,
        }
    }
}

impl GeneratorConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// The LLM is used only when enabled and a credential is present.
    pub fn is_configured(&self) -> bool {
        self.enabled
            && self
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if !self.enabled {
            return Ok(());
        }
        if self.base_url.trim().is_empty() || self.model.trim().is_empty() {
            return Err(QueryError::invalid("generator.base_url and generator.model are required"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(QueryError::invalid(format!(
                "generator.temperature must be in [0, 2], got {}",
                self.temperature
            )));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(QueryError::invalid(format!(
                "generator.top_p must be in (0, 1], got {}",
                self.top_p
            )));
        }
        if self.max_tokens == 0 || self.timeout_secs == 0 {
            return Err(QueryError::invalid(
                "generator.max_tokens and generator.timeout_secs must be positive",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generator: GeneratorConfig,
}

impl AssistantConfig {
    /// No network collaborators: lexical similarity and the rule-based answer.
    pub fn offline() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::lexical_only(),
            generator: GeneratorConfig::disabled(),
        }
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        self.retrieval.validate()?;
        self.embedding.validate().map_err(QueryError::InvalidConfiguration)?;
        self.generator.validate()
    }
}
