use anyhow::Result;
use eval::{BenchmarkResults, Benchmarker, get_test_set};
use ingest::Catalog;
use query::{Assistant, AssistantConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("=== Drug Catalog Assistant Benchmark ===\n");

    // --offline skips the embedding and LLM services entirely
    let config = if std::env::args().any(|arg| arg == "--offline") {
        AssistantConfig::offline()
    } else {
        AssistantConfig::default()
    };

    let assistant = Assistant::bootstrap(Catalog::builtin()?, config)?;
    let benchmarker = Benchmarker::new(assistant);

    let test_set = get_test_set();
    println!("Test set: {} questions\n", test_set.len());

    let results = benchmarker.run_benchmark(&test_set).await?;

    print_results(&results);

    let results_json = serde_json::to_string_pretty(&results)?;
    std::fs::write("benchmark_results.json", results_json)?;
    println!("\n✅ Results saved to benchmark_results.json");

    generate_readme_section(&results)?;
    println!("✅ Report saved to BENCHMARK.md");

    Ok(())
}

fn print_results(results: &BenchmarkResults) {
    println!("\n=== RESULTS ===\n");
    println!("  Embedder: {}", results.embedder);
    println!("  LLM configured: {}", results.llm_configured);
    println!("  Queries: {}", results.total_queries);
    println!("  Retrieval Accuracy: {:.0}%", results.retrieval_accuracy * 100.0);
    println!("  Avg Latency: {:.1} ms", results.avg_latency_ms);
    println!("  P50 Latency: {:.1} ms", results.p50_latency_ms);
    println!("  P95 Latency: {:.1} ms", results.p95_latency_ms);
    println!("  Avg Quality: {:.2}", results.avg_quality_score);

    println!("\n📊 BY CATEGORY:");
    for category in &results.by_category {
        println!(
            "  {:<18} n={:<3} retrieval={:.0}% quality={:.2}",
            category.category,
            category.count,
            category.retrieval_accuracy * 100.0,
            category.avg_quality
        );
    }

    if !results.misses.is_empty() {
        println!("\n⚠️  MISSES:");
        for miss in &results.misses {
            println!(
                "  \"{}\": expected {:?}, got {:?}",
                miss.question, miss.expected_entry, miss.actual_entry
            );
        }
    }
}

fn generate_readme_section(results: &BenchmarkResults) -> Result<()> {
    let category_rows: String = results
        .by_category
        .iter()
        .map(|c| {
            format!(
                "| {} | {} | {:.0}% | {:.2} |\n",
                c.category,
                c.count,
                c.retrieval_accuracy * 100.0,
                c.avg_quality
            )
        })
        .collect();

    let content = format!(
r#"# Benchmark Results

## Configuration

- Embedder: {}
- LLM configured: {}
- Test Set: {} questions

## Overall

| Retrieval Accuracy | Avg Latency | P50 Latency | P95 Latency | Quality Score |
|--------------------|-------------|-------------|-------------|---------------|
| {:.0}% | {:.1} ms | {:.1} ms | {:.1} ms | {:.2} |

## By Question Type

| Category | Questions | Retrieval Accuracy | Quality |
|----------|-----------|--------------------|---------|
{}
Retrieval accuracy counts a question as correct when the selected entry
matches the expected one, or when an out-of-catalog question yields no
information. Quality is the fraction of expected keywords in the answer.
"#,
        results.embedder,
        results.llm_configured,
        results.total_queries,
        results.retrieval_accuracy * 100.0,
        results.avg_latency_ms,
        results.p50_latency_ms,
        results.p95_latency_ms,
        results.avg_quality_score,
        category_rows,
    );

    std::fs::write("BENCHMARK.md", content)?;
    Ok(())
}
