use std::sync::Arc;

use async_trait::async_trait;
use ingest::DrugRecord;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::GeneratorConfig;
use crate::error::QueryError;
use crate::fallback::FallbackGenerator;
use crate::llm::{LlmError, QueryLLM};
use crate::prompt::build_answer_prompt;
use crate::retry::RetryPolicy;

/// Turns an assembled context plus a question into prose.
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn answer(&self, question: &str, context: &str, entry: &DrugRecord) -> Result<String, QueryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Llm,
    Fallback,
    NoInformation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub text: String,
    pub source: AnswerSource,
}

/// LLM-backed generator: fixed prompt, bounded retries, non-empty output.
pub struct LlmGenerator {
    llm: QueryLLM,
    retry: RetryPolicy,
}

impl LlmGenerator {
    pub fn new(llm: QueryLLM, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self, QueryError> {
        let llm = QueryLLM::new(config).map_err(|e| QueryError::invalid(format!("{:#}", e)))?;
        Ok(Self::new(llm, RetryPolicy::from_config(config)))
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn answer(&self, question: &str, context: &str, entry: &DrugRecord) -> Result<String, QueryError> {
        let prompt = build_answer_prompt(question, context, entry);

        let text = self
            .retry
            .retry("generate_answer", || self.llm.generate(&prompt), LlmError::is_transient)
            .await
            .map_err(|e| QueryError::GeneratorFailure(format!("{:#}", e)))?;

        if text.trim().is_empty() {
            return Err(QueryError::GeneratorFailure("empty completion".to_string()));
        }
        Ok(text.trim().to_string())
    }
}

/// Owns the try-LLM-then-fallback policy so callers always get an answer.
pub struct GeneratorAdapter {
    primary: Option<Arc<dyn Generator>>,
    fallback: FallbackGenerator,
}

impl GeneratorAdapter {
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, QueryError> {
        if !config.is_configured() {
            info!("LLM generator not configured, answers use the rule-based fallback");
            return Ok(Self::fallback_only());
        }
        let llm = LlmGenerator::from_config(config)?;
        info!(model = llm.llm.model(), "LLM generator configured");
        Ok(Self::with_primary(Arc::new(llm)))
    }

    pub fn fallback_only() -> Self {
        Self {
            primary: None,
            fallback: FallbackGenerator::new(),
        }
    }

    pub fn with_primary(primary: Arc<dyn Generator>) -> Self {
        Self {
            primary: Some(primary),
            fallback: FallbackGenerator::new(),
        }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub async fn answer(&self, question: &str, context: &str, entry: &DrugRecord) -> GeneratedAnswer {
        if let Some(primary) = &self.primary {
            match primary.answer(question, context, entry).await {
                Ok(text) if !text.trim().is_empty() => {
                    return GeneratedAnswer {
                        text,
                        source: AnswerSource::Llm,
                    };
                }
                Ok(_) => warn!(generator = primary.name(), "Generator returned empty text, using fallback"),
                Err(e) => warn!(generator = primary.name(), error = %e, "Generator failed, using fallback"),
            }
        }

        GeneratedAnswer {
            text: self.fallback.compose(question, entry),
            source: AnswerSource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest::Catalog;

    struct Fixed(&'static str);

    #[async_trait]
    impl Generator for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn answer(&self, _q: &str, _c: &str, _e: &DrugRecord) -> Result<String, QueryError> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl Generator for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn answer(&self, _q: &str, _c: &str, _e: &DrugRecord) -> Result<String, QueryError> {
            Err(QueryError::GeneratorFailure("timeout".to_string()))
        }
    }

    fn amoxicillin() -> DrugRecord {
        Catalog::builtin().unwrap().get("amoxicillin").unwrap().clone()
    }

    #[tokio::test]
    async fn test_primary_answer_is_used() {
        let adapter = GeneratorAdapter::with_primary(Arc::new(Fixed("Jawaban LLM")));
        let answer = adapter.answer("q", "ctx", &amoxicillin()).await;
        assert_eq!(answer.source, AnswerSource::Llm);
        assert_eq!(answer.text, "Jawaban LLM");
    }

    #[tokio::test]
    async fn test_failure_and_blank_fall_back_identically() {
        let entry = amoxicillin();
        let expected = FallbackGenerator::new().compose("efek samping amoxicillin", &entry);

        for adapter in [
            GeneratorAdapter::with_primary(Arc::new(Failing)),
            GeneratorAdapter::with_primary(Arc::new(Fixed("   "))),
            GeneratorAdapter::fallback_only(),
        ] {
            let answer = adapter.answer("efek samping amoxicillin", "ctx", &entry).await;
            assert_eq!(answer.source, AnswerSource::Fallback);
            assert_eq!(answer.text, expected);
        }
    }

    #[test]
    fn test_unconfigured_config_has_no_primary() {
        let adapter = GeneratorAdapter::from_config(&GeneratorConfig::default()).unwrap();
        assert!(!adapter.has_primary());

        let configured = GeneratorConfig {
            api_key: Some("secret".to_string()),
            ..GeneratorConfig::default()
        };
        assert!(GeneratorAdapter::from_config(&configured).unwrap().has_primary());
    }
}
