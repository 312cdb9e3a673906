use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// When false the lexical embedder is selected without probing.
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub cache_entries: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            timeout_secs: 30,
            cache_entries: 1024,
        }
    }
}

impl EmbeddingConfig {
    pub fn lexical_only() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        if self.base_url.trim().is_empty() {
            return Err("embedding.base_url must not be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("embedding.model must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("embedding.timeout_secs must be positive".to_string());
        }
        Ok(())
    }
}
