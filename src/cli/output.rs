//! Output formatting for CLI commands.

use std::io::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::benchmark::result::BenchmarkResult;
use crate::cli::args::OutputFormat;
use crate::distributed::metrics::DistributedMetrics;
use crate::error::Result;

/// Outcome of loading synthetic data into a distributed index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub index: String,
    pub partitions: usize,
    pub documents: u64,
    pub terms: usize,
    pub shard_documents: Vec<u64>,
    pub elapsed_ms: f64,
}

/// Write a load summary in the requested format.
pub fn output_load_summary(
    summary: &LoadSummary,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, summary)?;
            writeln!(out)?;
        }
        OutputFormat::Human => {
            writeln!(out, "Index: {}", summary.index)?;
            writeln!(out, "═════════════════")?;
            writeln!(out, "Documents: {}", summary.documents)?;
            writeln!(out, "Suggestion terms: {}", summary.terms)?;
            writeln!(out, "Load time: {:.2}ms", summary.elapsed_ms)?;
            writeln!(out)?;
            writeln!(out, "Shards ({}):", summary.partitions)?;
            writeln!(out, "──────────────────")?;
            for (i, count) in summary.shard_documents.iter().enumerate() {
                writeln!(out, "  {i:>3}: {count:>10} ({:.1}%)", share(*count, summary.documents))?;
            }
        }
    }
    Ok(())
}

/// Write the human-readable end-of-run summary.
pub fn output_bench_summary(
    result: &BenchmarkResult,
    metrics: &DistributedMetrics,
    out: &mut dyn Write,
) -> Result<()> {
    let quantiles = &result.overall_quantiles.all_commands;

    writeln!(out, "Benchmark Results:")?;
    writeln!(out, "═════════════════")?;
    writeln!(out, "Workers: {}", result.workers)?;
    writeln!(out, "Duration: {}ms", result.duration_millis)?;
    writeln!(out, "Total operations: {}", result.totals.total_ops)?;
    writeln!(out, "Failed operations: {}", result.totals.failed_ops)?;
    writeln!(out, "Operations per second: {:.2}", result.throughput())?;
    writeln!(out, "Average latency: {:.3}ms", result.avg_latency_ms())?;
    writeln!(out)?;
    writeln!(out, "Latency quantiles (ms):")?;
    writeln!(out, "──────────────────")?;
    writeln!(out, "  p50:   {:.3}", quantiles.q50)?;
    writeln!(out, "  p95:   {:.3}", quantiles.q95)?;
    writeln!(out, "  p99:   {:.3}", quantiles.q99)?;
    writeln!(out, "  p99.9: {:.3}", quantiles.q999)?;
    writeln!(out, "  max:   {:.3}", quantiles.q100)?;
    writeln!(out)?;
    writeln!(out, "Shard reads:")?;
    writeln!(out, "──────────────────")?;
    writeln!(out, "  Searches: {}", metrics.total_searches)?;
    writeln!(out, "  Suggests: {}", metrics.total_suggests)?;
    writeln!(out, "  Shard errors: {}", metrics.shard_errors)?;
    writeln!(out, "  Timeouts: {}", metrics.timeout_count)?;
    writeln!(out, "  Average fan-out: {}", format_duration(metrics.avg_latency))?;
    writeln!(out, "  Slowest fan-out: {}", format_duration(metrics.max_latency))?;
    Ok(())
}

fn share(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Format a duration with a unit that fits its size.
fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();
    if micros < 1_000 {
        format!("{micros}µs")
    } else if micros < 1_000_000 {
        format!("{:.2}ms", micros as f64 / 1_000.0)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> LoadSummary {
        LoadSummary {
            index: "idx".to_string(),
            partitions: 2,
            documents: 40,
            terms: 10,
            shard_documents: vec![30, 10],
            elapsed_ms: 1.5,
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_micros(250)), "250µs");
        assert_eq!(format_duration(Duration::from_micros(1_500)), "1.50ms");
        assert_eq!(format_duration(Duration::from_millis(2_500)), "2.50s");
    }

    #[test]
    fn test_share() {
        assert_eq!(share(10, 40), 25.0);
        assert_eq!(share(3, 0), 0.0);
    }

    #[test]
    fn test_human_load_summary() {
        let mut out = Vec::new();
        output_load_summary(&summary(), OutputFormat::Human, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Documents: 40"));
        assert!(text.contains("Shards (2):"));
        assert!(text.contains("(75.0%)"));
    }

    #[test]
    fn test_json_load_summary() {
        let mut out = Vec::new();
        output_load_summary(&summary(), OutputFormat::Json, &mut out).unwrap();
        let parsed: LoadSummary = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, summary());
    }
}
