use anyhow::Result;
use query::{Assistant, SessionMemory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

use crate::test_set::{QAPair, retrieval_hit, score_response};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResults {
    pub embedder: String,
    pub llm_configured: bool,
    pub total_queries: usize,
    pub retrieval_accuracy: f64,
    pub avg_latency_ms: f64,
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub avg_quality_score: f64,
    pub by_category: Vec<CategoryScore>,
    pub misses: Vec<Miss>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub retrieval_accuracy: f64,
    pub avg_quality: f64,
    pub count: usize,
}

/// A question whose retrieval did not land on the expected entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Miss {
    pub question: String,
    pub expected_entry: Option<String>,
    pub actual_entry: Option<String>,
}

#[derive(Default)]
struct CategoryTally {
    hits: usize,
    scores: Vec<f64>,
}

/// Runs a question set in-process against one assistant.
pub struct Benchmarker {
    assistant: Assistant,
}

impl Benchmarker {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }

    pub async fn run_benchmark(&self, test_set: &[QAPair]) -> Result<BenchmarkResults> {
        info!(questions = test_set.len(), "Running benchmark");

        let mut latencies = Vec::with_capacity(test_set.len());
        let mut scores = Vec::with_capacity(test_set.len());
        let mut hits = 0;
        let mut misses = Vec::new();
        let mut by_category: BTreeMap<String, CategoryTally> = BTreeMap::new();

        for qa in test_set {
            // Fresh session per question so answers stay independent
            let mut session = SessionMemory::new();

            let start = Instant::now();
            let response = self.assistant.ask(&qa.question, &mut session, None).await?;
            latencies.push(start.elapsed().as_secs_f64() * 1000.0);

            let hit = retrieval_hit(qa, &response);
            let score = score_response(qa, &response);
            debug!(question = %qa.question, hit, score, "Scored question");

            if hit {
                hits += 1;
            } else {
                misses.push(Miss {
                    question: qa.question.clone(),
                    expected_entry: qa.expected_entry.clone(),
                    actual_entry: response.entry_id.clone(),
                });
            }
            scores.push(score);

            let tally = by_category.entry(format!("{:?}", qa.category)).or_default();
            tally.hits += usize::from(hit);
            tally.scores.push(score);
        }

        let embedder = self
            .assistant
            .embedder_kind()
            .map(|kind| format!("{:?}", kind))
            .unwrap_or_else(|| "none".to_string());

        Ok(compute_results(
            embedder,
            self.assistant.generator_configured(),
            latencies,
            scores,
            hits,
            by_category,
            misses,
        ))
    }
}

fn compute_results(
    embedder: String,
    llm_configured: bool,
    mut latencies: Vec<f64>,
    scores: Vec<f64>,
    hits: usize,
    by_category: BTreeMap<String, CategoryTally>,
    misses: Vec<Miss>,
) -> BenchmarkResults {
    latencies.sort_by(|a, b| a.total_cmp(b));

    let by_category = by_category
        .into_iter()
        .map(|(category, tally)| CategoryScore {
            category,
            retrieval_accuracy: ratio(tally.hits, tally.scores.len()),
            avg_quality: mean(&tally.scores),
            count: tally.scores.len(),
        })
        .collect();

    BenchmarkResults {
        embedder,
        llm_configured,
        total_queries: scores.len(),
        retrieval_accuracy: ratio(hits, scores.len()),
        avg_latency_ms: mean(&latencies),
        p50_latency_ms: percentile(&latencies, 50),
        p95_latency_ms: percentile(&latencies, 95),
        avg_quality_score: mean(&scores),
        by_category,
        misses,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 / whole as f64 }
}

fn percentile(sorted_data: &[f64], p: usize) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    let index = (p as f64 / 100.0 * sorted_data.len() as f64) as usize;
    sorted_data[index.min(sorted_data.len() - 1)]
}
