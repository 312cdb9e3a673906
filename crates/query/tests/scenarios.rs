use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ingest::{Catalog, DrugRecord, FacetType};
use query::{
    AnswerSource, Assistant, AssistantConfig, FallbackGenerator, Generator, GeneratorAdapter,
    GeneratorConfig, NO_INFORMATION_MESSAGE, QueryError, SessionMemory,
};

fn offline_assistant() -> Assistant {
    Assistant::bootstrap(Catalog::builtin().unwrap(), AssistantConfig::offline()).unwrap()
}

/// Counts calls and always fails, so every answer comes from the fallback.
#[derive(Default)]
struct CountingFailure {
    calls: AtomicUsize,
}

#[async_trait]
impl Generator for CountingFailure {
    fn name(&self) -> &'static str {
        "counting-failure"
    }

    async fn answer(&self, _q: &str, _c: &str, _e: &DrugRecord) -> Result<String, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(QueryError::GeneratorFailure("forced".to_string()))
    }
}

#[tokio::test]
async fn test_headache_selects_paracetamol() {
    let assistant = offline_assistant();
    let mut session = SessionMemory::new();

    let retrieval = assistant.retrieve_information("sakit kepala", None).await.unwrap();
    assert_eq!(retrieval.selection.best_entry_id, "paracetamol");
    let indication = &retrieval.selection.per_facet_chunks[&FacetType::Indication];
    assert!(indication[0].chunk.content.contains("sakit kepala"));
    assert!(retrieval.context.contains("sakit kepala"));

    let response = assistant.ask("sakit kepala", &mut session, None).await.unwrap();
    assert_eq!(response.entry_id.as_deref(), Some("paracetamol"));
    assert!(response.answer.contains("Paracetamol"));
    assert_eq!(session.current_drug(), Some("Paracetamol"));
}

#[tokio::test]
async fn test_adult_dose_question() {
    let assistant = offline_assistant();
    let mut session = SessionMemory::new();

    let retrieval = assistant
        .retrieve_information("dosis paracetamol untuk dewasa", None)
        .await
        .unwrap();
    assert_eq!(retrieval.selection.best_entry_id, "paracetamol");
    assert!(retrieval.selection.per_facet_chunks.contains_key(&FacetType::Dose));

    let response = assistant
        .ask("dosis paracetamol untuk dewasa", &mut session, None)
        .await
        .unwrap();
    assert_eq!(response.source, AnswerSource::Fallback);
    assert!(response.answer.contains("500-1000 mg"));
    assert!(response.answer.contains("4000 mg"));
}

#[tokio::test]
async fn test_respiratory_infection_selects_amoxicillin() {
    let assistant = offline_assistant();
    let mut session = SessionMemory::new();

    let response = assistant
        .ask("infeksi saluran napas", &mut session, None)
        .await
        .unwrap();
    assert_eq!(response.entry_id.as_deref(), Some("amoxicillin"));
    assert!(response.answer.contains("Antibiotik"));
    assert!(response.answer.contains("infeksi saluran napas"));
    assert!(!response.answer.contains("Paracetamol"));
}

#[tokio::test]
async fn test_unknown_term_is_empty_retrieval() {
    let generator = Arc::new(CountingFailure::default());
    let assistant = offline_assistant()
        .with_generator(GeneratorAdapter::with_primary(generator.clone()));
    let mut session = SessionMemory::new();

    assert!(matches!(
        assistant.retrieve_information("xyzzy", None).await,
        Err(QueryError::EmptyRetrieval)
    ));

    let response = assistant.ask("xyzzy", &mut session, None).await.unwrap();
    assert_eq!(response.answer, NO_INFORMATION_MESSAGE);
    assert_eq!(response.source, AnswerSource::NoInformation);
    assert!(response.entry_id.is_none());
    assert!(response.sources.is_empty());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    assert!(session.current().is_none());
}

#[tokio::test]
async fn test_side_effects_without_llm() {
    let assistant = offline_assistant();
    let mut session = SessionMemory::new();

    let response = assistant
        .ask("efek samping amoxicillin", &mut session, None)
        .await
        .unwrap();
    let amoxicillin = assistant.catalog().get("amoxicillin").unwrap();

    assert_eq!(response.source, AnswerSource::Fallback);
    assert_eq!(response.entry_id.as_deref(), Some("amoxicillin"));
    assert!(response.answer.contains(&amoxicillin.adverse_effects));
    assert_eq!(
        response.answer,
        FallbackGenerator::new().compose("efek samping amoxicillin", amoxicillin)
    );
}

#[tokio::test]
async fn test_failing_llm_matches_disabled_llm() {
    let question = "efek samping amoxicillin";
    let disabled = offline_assistant()
        .ask(question, &mut SessionMemory::new(), None)
        .await
        .unwrap();

    // Transport failure: enabled, credentialed, nothing listening
    let mut config = AssistantConfig::offline();
    config.generator = GeneratorConfig {
        enabled: true,
        api_key: Some("test-key".to_string()),
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_secs: 2,
        max_retries: 0,
        ..GeneratorConfig::default()
    };
    let unreachable = Assistant::bootstrap(Catalog::builtin().unwrap(), config).unwrap();
    assert!(unreachable.generator_configured());
    let transport = unreachable
        .ask(question, &mut SessionMemory::new(), None)
        .await
        .unwrap();

    // Injected generator error
    let generator = Arc::new(CountingFailure::default());
    let injected = offline_assistant()
        .with_generator(GeneratorAdapter::with_primary(generator.clone()))
        .ask(question, &mut SessionMemory::new(), None)
        .await
        .unwrap();

    assert_eq!(transport.answer, disabled.answer);
    assert_eq!(injected.answer, disabled.answer);
    assert_eq!(transport.source, AnswerSource::Fallback);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rank_is_sorted_above_floor_and_idempotent() {
    let assistant = offline_assistant();

    for query in ["dosis paracetamol untuk dewasa", "efek samping amoxicillin", "obat untuk demam"] {
        let first = assistant.rank(query, 5).await.unwrap();
        let second = assistant.rank(query, 5).await.unwrap();
        assert_eq!(first, second);
        assert!(first.len() <= 5);
        assert!(first.iter().all(|c| c.score > 0.1));
        assert!(first.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[tokio::test]
async fn test_rank_respects_k_bounds() {
    let assistant = offline_assistant();
    assert_eq!(assistant.rank("dosis paracetamol untuk dewasa", 3).await.unwrap().len(), 3);
    assert!(matches!(
        assistant.rank("dosis", 6).await,
        Err(QueryError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        assistant.ask("dosis", &mut SessionMemory::new(), Some(0)).await,
        Err(QueryError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        assistant.ask("   ", &mut SessionMemory::new(), None).await,
        Err(QueryError::InvalidConfiguration(_))
    ));
}

#[tokio::test]
async fn test_context_only_lists_retrieved_facets_in_order() {
    let assistant = offline_assistant();
    let retrieval = assistant
        .retrieve_information("dosis paracetamol untuk dewasa", Some(5))
        .await
        .unwrap();

    let facets: Vec<FacetType> = retrieval.selection.per_facet_chunks.keys().copied().collect();
    let mut last = 0;
    for facet in FacetType::ALL {
        let heading = format!("\n{}:\n", facet.heading());
        let found = retrieval.context.find(&heading);
        if facets.contains(&facet) {
            let at = found.unwrap();
            assert!(at >= last);
            last = at;
        } else {
            assert!(found.is_none(), "{} should be absent", facet);
        }
    }
    assert!(retrieval.context.contains("INFORMASI UMUM:"));
}

#[tokio::test]
async fn test_duplicate_record_does_not_change_choice() {
    let builtin = Catalog::builtin().unwrap();
    let paracetamol = builtin.get("paracetamol").unwrap().clone();
    let mut copy = paracetamol.clone();
    copy.entry_id = "paracetamol-copy".to_string();
    let amoxicillin = builtin.get("amoxicillin").unwrap().clone();

    let catalog = Catalog::from_records(vec![paracetamol, copy, amoxicillin]).unwrap();
    let assistant = Assistant::bootstrap(catalog, AssistantConfig::offline()).unwrap();

    for query in ["sakit kepala", "dosis paracetamol untuk dewasa"] {
        let retrieval = assistant.retrieve_information(query, None).await.unwrap();
        assert_eq!(retrieval.selection.best_entry_id, "paracetamol", "query {}", query);
    }
}

#[tokio::test]
async fn test_single_entry_catalog() {
    let paracetamol = Catalog::builtin().unwrap().get("paracetamol").unwrap().clone();
    let catalog = Catalog::from_records(vec![paracetamol]).unwrap();
    let assistant = Assistant::bootstrap(catalog, AssistantConfig::offline()).unwrap();

    let mut session = SessionMemory::new();
    let hit = assistant.ask("sakit kepala", &mut session, None).await.unwrap();
    assert_eq!(hit.entry_id.as_deref(), Some("paracetamol"));

    let miss = assistant.ask("infeksi saluran napas", &mut session, None).await.unwrap();
    assert_eq!(miss.source, AnswerSource::NoInformation);
    assert_eq!(session.current_drug(), Some("Paracetamol"));
}

#[test]
fn test_empty_catalog_is_rejected_at_bootstrap() {
    assert!(matches!(
        Assistant::bootstrap(Catalog::default(), AssistantConfig::offline()),
        Err(QueryError::InvalidConfiguration(_))
    ));
}
