use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use shardbench::benchmark::config::{BenchmarkConfig, ErrorPolicy};
use shardbench::benchmark::harness::{Benchmark, BenchmarkState};
use shardbench::benchmark::result::BenchmarkResult;
use shardbench::benchmark::workload::{WorkloadKind, search_workload, suggest_workload};
use shardbench::distributed::config::DistributedIndexConfig;
use shardbench::distributed::engine::DistributedIndex;
use shardbench::error::Result;
use shardbench::index::autocomplete::Autocompleter;
use shardbench::index::index::Index;
use shardbench::index::metadata::Metadata;
use shardbench::index::options::IndexingOptions;
use shardbench::query::flags::QueryFlags;
use shardbench::synth::{DocumentGenerator, vocabulary, vocabulary_suggestions};

fn loaded_index(partitions: usize, docs: usize) -> Result<Arc<DistributedIndex>> {
    let index = DistributedIndex::in_memory(
        "bench",
        Metadata::wikipedia(),
        DistributedIndexConfig::new(partitions).with_pool_workers(8),
    )?;
    index.create()?;

    let mut generator = DocumentGenerator::with_seed(50, DocumentGenerator::default_fields(), 11)?;
    index.index(generator.generate_batch(docs), &IndexingOptions::default())?;
    index.add_terms(&vocabulary_suggestions(50))?;
    Ok(Arc::new(index))
}

#[test]
fn noop_run_reports_throughput_within_duration() -> Result<()> {
    let benchmark = Benchmark::new(
        BenchmarkConfig::new(1, Duration::from_millis(100)).without_reporting(),
    )?;

    let start = Instant::now();
    let result = benchmark.run(|| Ok(()))?;

    assert!(start.elapsed() < Duration::from_millis(600));
    assert!(result.throughput() > 0.0);
    assert!(result.totals.total_ops > 0);
    assert_eq!(result.totals.failed_ops, 0);
    assert_eq!(benchmark.state(), BenchmarkState::Reported);
    Ok(())
}

#[test]
fn search_workload_over_distributed_index() -> Result<()> {
    let index = loaded_index(3, 200)?;
    let op = search_workload(index.clone(), vocabulary(10), None, QueryFlags::NONE)?;

    let title = WorkloadKind::Search.title(10);
    let benchmark = Benchmark::new(
        BenchmarkConfig::new(2, Duration::from_millis(200))
            .without_reporting()
            .with_names("memory", title.clone()),
    )?;
    let result = benchmark.run(op)?;

    assert!(result.totals.total_ops > 0);
    assert_eq!(index.metrics().total_searches, result.totals.total_ops);
    let quantiles = &result.overall_quantiles.all_commands;
    assert!(quantiles.q50 <= quantiles.q100);

    let row = benchmark.csv_row(&result);
    assert_eq!(row.title, "search: 10 terms");
    assert_eq!(row.concurrency, 2);
    Ok(())
}

#[test]
fn failing_backend_aborts_by_default_and_counts_on_request() -> Result<()> {
    let index = loaded_index(2, 20)?;
    index.drop_index()?;

    let op = search_workload(index.clone(), vocabulary(5), None, QueryFlags::NONE)?;
    let benchmark = Benchmark::new(
        BenchmarkConfig::new(2, Duration::from_secs(5)).without_reporting(),
    )?;
    let start = Instant::now();
    assert!(benchmark.run(&op).is_err());
    assert!(start.elapsed() < Duration::from_secs(2));

    let counting = Benchmark::new(
        BenchmarkConfig::new(2, Duration::from_millis(100))
            .without_reporting()
            .with_error_policy(ErrorPolicy::Count),
    )?;
    let result = counting.run(&op)?;
    assert_eq!(result.totals.total_ops, 0);
    assert!(result.totals.failed_ops > 0);
    assert_eq!(result.failure_rate(), 1.0);
    Ok(())
}

#[test]
fn results_are_written_as_json_and_csv() -> Result<()> {
    let index = loaded_index(2, 50)?;
    let op = suggest_workload(index, vec!["term".into(), "term1".into()], false)?;

    let benchmark = Benchmark::new(
        BenchmarkConfig::new(1, Duration::from_millis(100))
            .with_reporting_period(Duration::from_millis(20))
            .with_names("memory", WorkloadKind::Suggest.title(2))
            .with_db_config("partitions", 2),
    )?;
    let mut progress = Vec::new();
    let result = benchmark.run_with_output(op, &mut progress)?;

    let dir = TempDir::new()?;
    let json_path = dir.path().join("result.json");
    let csv_path = dir.path().join("results.csv");

    result.write_json(&json_path)?;
    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path)?)?;
    assert_eq!(raw["ResultFormatVersion"], "0.1");
    assert_eq!(raw["Workers"], 1);
    assert_eq!(raw["DBSpecificConfigs"]["partitions"], 2);
    assert!(raw["OverallRates"]["overallOpsRate"].as_f64().unwrap() > 0.0);
    assert!(raw["OverallQuantiles"]["allCommands"]["q50"].is_number());
    assert!(raw["TimeSeries"]["allCommands"].is_array());

    let read_back = BenchmarkResult::read_json(&json_path)?;
    assert_eq!(read_back.totals.total_ops, result.totals.total_ops);

    let row = benchmark.csv_row(&result);
    row.append_to(&csv_path)?;
    row.append_to(&csv_path)?;
    let csv = std::fs::read_to_string(&csv_path)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("memory,suggest: 2 terms,1,"));

    assert!(!progress.is_empty());
    Ok(())
}
