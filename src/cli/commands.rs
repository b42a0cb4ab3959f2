//! Command implementations for the shardbench CLI.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::benchmark::config::BenchmarkConfig;
use crate::benchmark::harness::Benchmark;
use crate::benchmark::result::{BenchmarkResult, STDOUT_PATH};
use crate::benchmark::workload::{
    WorkloadKind, prefix_workload, search_workload, suggest_workload, wildcard_workload,
};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::distributed::config::DistributedIndexConfig;
use crate::distributed::engine::DistributedIndex;
use crate::error::{Result, ShardBenchError};
use crate::index::autocomplete::Autocompleter;
use crate::index::index::Index;
use crate::index::metadata::Metadata;
use crate::index::options::IndexingOptions;
use crate::query::flags::QueryFlags;
use crate::synth::{DocumentGenerator, vocabulary, vocabulary_suggestions};

/// Settings loaded from `--config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Distributed index settings.
    pub index: DistributedIndexConfig,

    /// Benchmark harness settings.
    pub benchmark: BenchmarkConfig,
}

impl FileConfig {
    /// Load a config from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Execute a CLI command.
pub fn execute_command(args: ShardBenchArgs) -> Result<()> {
    let file_config = match &args.config {
        Some(path) => {
            debug!("loading configuration from {}", path.display());
            FileConfig::load(path)?
        }
        None => FileConfig::default(),
    };

    match &args.command {
        Command::Bench(bench_args) => run_bench(bench_args, file_config, &args),
        Command::Ingest(ingest_args) => run_ingest(ingest_args, file_config, &args),
    }
}

/// Merge index flags over the file config.
pub fn index_config(
    args: &IndexArgs,
    mut config: DistributedIndexConfig,
) -> DistributedIndexConfig {
    if let Some(partitions) = args.partitions {
        config.partitions = partitions;
    }
    if let Some(workers) = args.pool_workers {
        config.pool_workers = Some(workers);
    }
    match args.shard_timeout_ms {
        Some(0) => config.shard_timeout = None,
        Some(ms) => config.shard_timeout = Some(Duration::from_millis(ms)),
        None => {}
    }
    config
}

/// Merge bench flags over the file config.
pub fn benchmark_config(args: &BenchArgs, mut config: BenchmarkConfig) -> BenchmarkConfig {
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(secs) = args.duration {
        config.duration = Duration::from_secs(secs);
    }
    if let Some(ms) = args.reporting_period_ms {
        config.reporting_period = Duration::from_millis(ms);
    }
    if let Some(policy) = args.on_error {
        config.error_policy = policy.into();
    }
    config
}

/// Build a sharded in-memory index and fill it with synthetic data.
fn load_index(
    args: &IndexArgs,
    config: DistributedIndexConfig,
) -> Result<(DistributedIndex, LoadSummary)> {
    if args.chunk_size == 0 {
        return Err(ShardBenchError::invalid_argument(
            "chunk size must be greater than zero",
        ));
    }

    let latency =
        (args.shard_latency_ms > 0).then(|| Duration::from_millis(args.shard_latency_ms));
    let index = DistributedIndex::in_memory_with_latency(
        &args.name,
        Metadata::wikipedia(),
        config,
        latency,
    )?;
    index.create()?;

    let fields = DocumentGenerator::default_fields();
    let mut generator = match args.seed {
        Some(seed) => DocumentGenerator::with_seed(args.vocab, fields, seed)?,
        None => DocumentGenerator::new(args.vocab, fields)?,
    };

    let start = Instant::now();
    let options = IndexingOptions::default();
    let mut remaining = args.docs;
    while remaining > 0 {
        let n = remaining.min(args.chunk_size);
        index.index(generator.generate_batch(n), &options)?;
        remaining -= n;
        debug!("indexed {} of {} documents", args.docs - remaining, args.docs);
    }
    index.add_terms(&vocabulary_suggestions(args.vocab))?;
    let took = start.elapsed();

    let mut shard_documents = Vec::with_capacity(index.partitions());
    for i in 0..index.partitions() {
        let count = match index.shard(i) {
            Some(shard) => shard.document_count()?,
            None => 0,
        };
        shard_documents.push(count);
    }

    info!(
        "loaded {} documents into '{}' across {} shards in {took:?}",
        args.docs,
        args.name,
        index.partitions()
    );

    let summary = LoadSummary {
        index: args.name.clone(),
        partitions: index.partitions(),
        documents: index.document_count()?,
        terms: args.vocab,
        shard_documents,
        elapsed_ms: took.as_secs_f64() * 1000.0,
    };
    Ok((index, summary))
}

/// Load synthetic documents and report per-shard counts.
fn run_ingest(
    args: &IngestArgs,
    file_config: FileConfig,
    cli_args: &ShardBenchArgs,
) -> Result<()> {
    let config = index_config(&args.index, file_config.index);
    let (index, summary) = load_index(&args.index, config)?;
    index.shutdown();

    if cli_args.verbosity() > 0 {
        output_load_summary(&summary, args.format, &mut io::stdout())?;
    }
    Ok(())
}

/// Load synthetic documents, run the selected workload and write the results.
fn run_bench(
    args: &BenchArgs,
    file_config: FileConfig,
    cli_args: &ShardBenchArgs,
) -> Result<()> {
    let index_config = index_config(&args.index, file_config.index);
    let partitions = index_config.partitions;
    let (index, summary) = load_index(&args.index, index_config)?;
    let index = Arc::new(index);

    let kind = WorkloadKind::from(args.workload);
    let title = kind.title(args.terms);
    let mut config = benchmark_config(args, file_config.benchmark)
        .with_names("memory", title)
        .with_db_config("partitions", partitions)
        .with_db_config("documents", summary.documents)
        .with_db_config("shardLatencyMs", args.index.shard_latency_ms);
    if cli_args.verbosity() == 0 {
        config = config.without_reporting();
    }
    let benchmark = Benchmark::new(config)?;

    let terms = vocabulary(args.terms.min(args.index.vocab).max(1));
    let result = match kind {
        WorkloadKind::Search => {
            let op = search_workload(index.clone(), terms, args.field.clone(), QueryFlags::NONE)?;
            run_workload(&benchmark, op, &args.output)?
        }
        WorkloadKind::Prefix => {
            let op = prefix_workload(
                index.clone(),
                terms,
                args.field.clone(),
                args.prefix_min,
                args.prefix_max,
            )?;
            run_workload(&benchmark, op, &args.output)?
        }
        WorkloadKind::Wildcard => {
            let op = wildcard_workload(
                index.clone(),
                terms,
                args.field.clone(),
                args.prefix_min,
                args.prefix_max,
            )?;
            run_workload(&benchmark, op, &args.output)?
        }
        WorkloadKind::Suggest => {
            let prefixes = terms
                .iter()
                .map(|t| t.chars().take(args.prefix_max.max(1)).collect())
                .collect();
            let op = suggest_workload(index.clone(), prefixes, args.fuzzy)?;
            run_workload(&benchmark, op, &args.output)?
        }
    };

    let metrics = index.metrics();
    index.shutdown();

    result.write_json(&args.output)?;
    if let Some(csv) = &args.csv {
        benchmark.csv_row(&result).append_to(csv)?;
    }

    if cli_args.verbosity() > 0 && args.output != STDOUT_PATH {
        output_bench_summary(&result, &metrics, &mut io::stdout())?;
    }
    Ok(())
}

/// Run `op`, sending progress to stderr when stdout carries the result.
fn run_workload<F>(benchmark: &Benchmark, op: F, output: &str) -> Result<BenchmarkResult>
where
    F: Fn() -> Result<()> + Sync,
{
    if output == STDOUT_PATH {
        benchmark.run_with_output(op, &mut io::stderr())
    } else {
        benchmark.run(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn parse(argv: &[&str]) -> ShardBenchArgs {
        ShardBenchArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_override_file_config() {
        let args = parse(&[
            "shardbench",
            "bench",
            "-p",
            "2",
            "--shard-timeout-ms",
            "0",
            "-C",
            "3",
            "--on-error",
            "count",
        ]);
        let Command::Bench(bench) = args.command else {
            panic!("Expected Bench command");
        };

        let file = FileConfig::default();
        let index = index_config(&bench.index, file.index);
        assert_eq!(index.partitions, 2);
        assert_eq!(index.shard_timeout, None);

        let run = benchmark_config(&bench, file.benchmark);
        assert_eq!(run.concurrency, 3);
        assert_eq!(
            run.error_policy,
            crate::benchmark::config::ErrorPolicy::Count
        );
    }

    #[test]
    fn test_load_file_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "index": {"partitions": 6},
                "benchmark": {"concurrency": 2, "title": "from file"}
            }"#,
        )
        .unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.index.partitions, 6);
        assert_eq!(config.benchmark.concurrency, 2);
        assert_eq!(config.benchmark.title, "from file");
        assert!(config.index.enable_metrics);
    }

    #[test]
    fn test_ingest_loads_every_document() {
        let args = parse(&[
            "shardbench", "ingest", "-p", "3", "-n", "120", "--vocab", "20", "--seed", "1",
        ]);
        let Command::Ingest(ingest) = args.command else {
            panic!("Expected Ingest command");
        };

        let config = index_config(&ingest.index, DistributedIndexConfig::default());
        let (index, summary) = load_index(&ingest.index, config).unwrap();

        assert_eq!(summary.partitions, 3);
        assert_eq!(summary.documents, 120);
        assert_eq!(summary.shard_documents.iter().sum::<u64>(), 120);
        assert_eq!(index.suggest("term1", 5, false).unwrap()[0].term, "term1");
    }

    #[test]
    fn test_bench_writes_json_and_csv() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("result.json");
        let csv = dir.path().join("result.csv");
        let json_arg = json.to_string_lossy().to_string();
        let csv_arg = csv.to_string_lossy().to_string();

        let args = parse(&[
            "shardbench",
            "--quiet",
            "bench",
            "-p",
            "2",
            "-n",
            "50",
            "--vocab",
            "20",
            "--terms",
            "10",
            "-C",
            "2",
            "--duration",
            "1",
            "--output",
            &json_arg,
            "--csv",
            &csv_arg,
        ]);
        execute_command(args).unwrap();

        let result = BenchmarkResult::read_json(&json).unwrap();
        assert_eq!(result.workers, 2);
        assert!(result.totals.total_ops > 0);

        let line = std::fs::read_to_string(&csv).unwrap();
        assert!(line.starts_with("memory,search: 10 terms,2,"));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let args = parse(&["shardbench", "ingest", "--chunk-size", "0"]);
        let Command::Ingest(ingest) = args.command else {
            panic!("Expected Ingest command");
        };
        assert!(load_index(&ingest.index, DistributedIndexConfig::new(2)).is_err());
    }
}
