use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use index::EmbeddingConfig;
use query::{AssistantConfig, GeneratorConfig, QueryError, RetrievalConfig};
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_FILE: &str = "obat.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON file or directory of JSON files; the bundled catalog when unset.
    pub path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Defaults, then `obat.toml` (or `$OBAT_CONFIG_FILE`), then `OBAT_*`
    /// environment variables with `__` between nested keys.
    pub fn load() -> anyhow::Result<Self> {
        let file = std::env::var("OBAT_CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let figment = Self::base()
            .merge(Toml::file(file))
            .merge(Env::prefixed("OBAT_").split("__"));
        Self::from_figment(figment)
    }

    pub fn base() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
    }

    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.server.bind_addr.trim().is_empty() {
            return Err(QueryError::invalid("server.bind_addr must not be empty"));
        }
        self.assistant_config().validate()
    }

    pub fn assistant_config(&self) -> AssistantConfig {
        AssistantConfig {
            retrieval: self.retrieval.clone(),
            embedding: self.embedding.clone(),
            generator: self.generator.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest::FacetType;

    #[test]
    fn test_defaults_load() {
        let config = AppConfig::from_figment(AppConfig::base()).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.retrieval.top_k, 3);
        assert!(config.catalog.path.is_none());
        assert!(!config.generator.is_configured());
    }

    #[test]
    fn test_toml_overrides_nested_keys() {
        let figment = AppConfig::base().merge(Toml::string(
            r#"
            [server]
            log_format = "json"

            [catalog]
            path = "data/catalog.json"

            [retrieval]
            top_k = 5
            facet_order = ["dose", "adverse"]

            [generator]
            api_key = "secret"
            "#,
        ));

        let config = AppConfig::from_figment(figment).unwrap();
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.catalog.path, Some(PathBuf::from("data/catalog.json")));
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.relevance_floor, 0.1);
        assert_eq!(config.retrieval.facet_order, vec![FacetType::Dose, FacetType::Adverse]);
        assert!(config.generator.is_configured());
    }

    #[test]
    fn test_invalid_values_fail_at_startup() {
        let figment = AppConfig::base().merge(Toml::string("[retrieval]\ntop_k = 9"));
        assert!(AppConfig::from_figment(figment).is_err());

        let figment = AppConfig::base().merge(Toml::string("[retrieval]\nfacet_order = []"));
        assert!(AppConfig::from_figment(figment).is_err());
    }
}
