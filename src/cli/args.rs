//! Command line argument definitions for the shardbench CLI.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::benchmark::config::ErrorPolicy;
use crate::benchmark::workload::WorkloadKind;

/// Shardbench - sharded search aggregation and load benchmarking
#[derive(Parser, Debug, Clone)]
#[command(name = "shardbench")]
#[command(about = "Benchmark a sharded fan-out/merge search index")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct ShardBenchArgs {
    /// Enable verbose output
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// JSON configuration file; flags override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl ShardBenchArgs {
    /// Get verbosity level (0 = quiet, 1 = normal, 2+ = verbose)
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Load synthetic documents into a sharded in-memory index and run a workload
    Bench(BenchArgs),

    /// Load synthetic documents into a sharded in-memory index and print shard counts
    Ingest(IngestArgs),
}

/// Settings shared by every command that builds an index.
#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    /// Index name
    #[arg(long, default_value = "idx")]
    pub name: String,

    /// Number of shards
    #[arg(short, long)]
    pub partitions: Option<usize>,

    /// Number of pool workers (default: 50 per shard)
    #[arg(long)]
    pub pool_workers: Option<usize>,

    /// Per-request shard deadline in milliseconds (0 disables it)
    #[arg(long)]
    pub shard_timeout_ms: Option<u64>,

    /// Artificial latency added to every shard read, in milliseconds
    #[arg(long, default_value = "0")]
    pub shard_latency_ms: u64,

    /// Number of synthetic documents to load
    #[arg(short = 'n', long, default_value = "1000")]
    pub docs: usize,

    /// Number of distinct vocabulary terms
    #[arg(long, default_value = "1000")]
    pub vocab: usize,

    /// Documents sent per indexing call
    #[arg(long, default_value = "100")]
    pub chunk_size: usize,

    /// Seed for the document generator
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the bench command
#[derive(Args, Debug, Clone)]
pub struct BenchArgs {
    #[command(flatten)]
    pub index: IndexArgs,

    /// Workload to run
    #[arg(short, long, value_enum, default_value = "search")]
    pub workload: WorkloadArg,

    /// Number of concurrent workers
    #[arg(short = 'C', long)]
    pub concurrency: Option<usize>,

    /// Run length in seconds
    #[arg(short, long)]
    pub duration: Option<u64>,

    /// Progress report period in milliseconds (0 disables it)
    #[arg(long)]
    pub reporting_period_ms: Option<u64>,

    /// What to do when an operation fails
    #[arg(long, value_enum)]
    pub on_error: Option<ErrorPolicyArg>,

    /// Number of vocabulary terms used as query input
    #[arg(long, default_value = "100")]
    pub terms: usize,

    /// Restrict queries to this field
    #[arg(long)]
    pub field: Option<String>,

    /// Shortest prefix for prefix and wildcard workloads
    #[arg(long, default_value = "3")]
    pub prefix_min: usize,

    /// Longest prefix for prefix and wildcard workloads
    #[arg(long, default_value = "5")]
    pub prefix_max: usize,

    /// Allow one edit in suggestion prefixes
    #[arg(long)]
    pub fuzzy: bool,

    /// JSON result file ("-" for stdout)
    #[arg(short, long, default_value = "benchmark.json")]
    pub output: String,

    /// CSV file the summary row is appended to ("-" for stdout)
    #[arg(long)]
    pub csv: Option<String>,
}

/// Arguments for the ingest command
#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[command(flatten)]
    pub index: IndexArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    pub format: OutputFormat,
}

/// Workload names accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadArg {
    /// Full-text search for vocabulary terms
    Search,
    /// Prefix search for vocabulary term prefixes
    Prefix,
    /// Wildcard search built from term prefixes
    Wildcard,
    /// Autocomplete suggestions
    Suggest,
}

impl From<WorkloadArg> for WorkloadKind {
    fn from(arg: WorkloadArg) -> Self {
        match arg {
            WorkloadArg::Search => WorkloadKind::Search,
            WorkloadArg::Prefix => WorkloadKind::Prefix,
            WorkloadArg::Wildcard => WorkloadKind::Wildcard,
            WorkloadArg::Suggest => WorkloadKind::Suggest,
        }
    }
}

/// Error policies accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicyArg {
    /// Stop the run on the first failure
    Abort,
    /// Count failures and keep going
    Count,
}

impl From<ErrorPolicyArg> for ErrorPolicy {
    fn from(arg: ErrorPolicyArg) -> Self {
        match arg {
            ErrorPolicyArg::Abort => ErrorPolicy::Abort,
            ErrorPolicyArg::Count => ErrorPolicy::Count,
        }
    }
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
