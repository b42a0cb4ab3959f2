//! The benchmark harness.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam_channel::{Sender, bounded};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::benchmark::config::{BenchmarkConfig, ErrorPolicy};
use crate::benchmark::histogram::LatencyHistogram;
use crate::benchmark::reporter;
use crate::benchmark::result::{
    BenchmarkResult, CsvRow, OverallQuantiles, OverallRates, RESULT_FORMAT_VERSION, Totals,
};
use crate::error::{Result, ShardBenchError};

/// Lifecycle of a benchmark instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkState {
    /// No run has started.
    Idle,
    /// Workers are issuing operations.
    Running,
    /// The deadline passed; in-flight operations are finishing.
    Draining,
    /// The last run produced its result or error.
    Reported,
}

/// Counters and histogram shared by the workers of one run.
#[derive(Debug)]
pub(crate) struct RunCounters {
    pub(crate) total_ops: AtomicU64,
    pub(crate) failed_ops: AtomicU64,
    pub(crate) total_latency_nanos: AtomicU64,
    pub(crate) histogram: Mutex<LatencyHistogram>,
    aborted: AtomicBool,
    first_error: Mutex<Option<ShardBenchError>>,
}

impl RunCounters {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            total_ops: AtomicU64::new(0),
            failed_ops: AtomicU64::new(0),
            total_latency_nanos: AtomicU64::new(0),
            histogram: Mutex::new(LatencyHistogram::new()?),
            aborted: AtomicBool::new(false),
            first_error: Mutex::new(None),
        })
    }

    fn record_success(&self, latency: Duration) {
        self.total_ops.fetch_add(1, Ordering::Relaxed);
        self.total_latency_nanos
            .fetch_add(latency.as_nanos().min(u64::MAX as u128) as u64, Ordering::Relaxed);
        self.histogram.lock().record(latency);
    }

    /// Store the first fatal error and tell every worker to stop.
    fn abort(&self, error: ShardBenchError) {
        let mut first = self.first_error.lock();
        if first.is_none() {
            *first = Some(error);
        }
        self.aborted.store(true, Ordering::Release);
    }

    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }
}

/// Runs one operation concurrently for a fixed duration and measures it.
///
/// ```
/// use std::time::Duration;
/// use shardbench::benchmark::config::BenchmarkConfig;
/// use shardbench::benchmark::harness::Benchmark;
///
/// let config = BenchmarkConfig::new(2, Duration::from_millis(50)).without_reporting();
/// let bench = Benchmark::new(config).unwrap();
/// let result = bench.run(|| Ok(())).unwrap();
/// assert!(result.throughput() > 0.0);
/// ```
#[derive(Debug)]
pub struct Benchmark {
    config: BenchmarkConfig,
    state: Mutex<BenchmarkState>,
}

impl Benchmark {
    /// Create a harness for `config`.
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: Mutex::new(BenchmarkState::Idle),
        })
    }

    /// Configuration.
    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BenchmarkState {
        *self.state.lock()
    }

    fn set_state(&self, state: BenchmarkState) {
        *self.state.lock() = state;
    }

    /// Run `operation` and print progress to stdout.
    pub fn run<F>(&self, operation: F) -> Result<BenchmarkResult>
    where
        F: Fn() -> Result<()> + Sync,
    {
        self.run_with_output(operation, &mut io::stdout())
    }

    /// Run `operation` and print progress to `progress`.
    pub fn run_with_output<F>(
        &self,
        operation: F,
        progress: &mut (dyn Write + Send),
    ) -> Result<BenchmarkResult>
    where
        F: Fn() -> Result<()> + Sync,
    {
        {
            let mut state = self.state.lock();
            if matches!(*state, BenchmarkState::Running | BenchmarkState::Draining) {
                return Err(ShardBenchError::benchmark("a run is already in progress"));
            }
            *state = BenchmarkState::Running;
        }

        let outcome = self.execute(&operation, progress);
        self.set_state(BenchmarkState::Reported);
        outcome
    }

    fn execute<F>(
        &self,
        operation: &F,
        progress: &mut (dyn Write + Send),
    ) -> Result<BenchmarkResult>
    where
        F: Fn() -> Result<()> + Sync,
    {
        let counters = RunCounters::new()?;
        let concurrency = self.config.concurrency;
        let duration = self.config.duration;

        info!(
            "starting '{}' on {}: {concurrency} workers for {duration:?}",
            self.config.title, self.config.engine
        );

        let start_time = Utc::now();
        let start = Instant::now();
        // A duration past the end of the clock runs until aborted
        let end = start.checked_add(duration);

        let (time_series, worker_failure) = thread::scope(|s| -> Result<_> {
            let (stop_tx, stop_rx) = bounded::<()>(1);
            let (abort_tx, abort_rx) = bounded::<()>(1);

            let reporter = if self.config.reporting_period.is_zero() {
                None
            } else {
                let period = self.config.reporting_period;
                let counters = &counters;
                Some(
                    thread::Builder::new()
                        .name("shardbench-reporter".to_string())
                        .spawn_scoped(s, move || {
                            reporter::run(period, start, duration, counters, stop_rx, progress)
                        })?,
                )
            };

            let mut workers = Vec::with_capacity(concurrency);
            for worker_id in 0..concurrency {
                let counters = &counters;
                let abort_tx = abort_tx.clone();
                let policy = self.config.error_policy;
                workers.push(
                    thread::Builder::new()
                        .name(format!("shardbench-bench-{worker_id}"))
                        .spawn_scoped(s, move || {
                            worker_loop(operation, counters, end, policy, &abort_tx)
                        })?,
                );
            }
            drop(abort_tx);

            // Sleep until the deadline unless a worker aborts the run first
            let _ = match end {
                Some(end) => abort_rx.recv_deadline(end).map_err(|_| ()),
                None => abort_rx.recv().map_err(|_| ()),
            };
            self.set_state(BenchmarkState::Draining);

            let mut worker_failure = None;
            for worker in workers {
                if worker.join().is_err() {
                    worker_failure = Some(ShardBenchError::benchmark("benchmark worker panicked"));
                }
            }

            drop(stop_tx);
            let time_series = match reporter {
                Some(handle) => handle.join().unwrap_or_default(),
                None => Vec::new(),
            };

            Ok((time_series, worker_failure))
        })?;

        let elapsed = start.elapsed();
        let end_time = Utc::now();

        if let Some(error) = counters.first_error.lock().take() {
            warn!("benchmark aborted: {error}");
            return Err(ShardBenchError::benchmark(format!(
                "operation failed: {error}"
            )));
        }
        if let Some(error) = worker_failure {
            return Err(error);
        }

        let total_ops = counters.total_ops.load(Ordering::Relaxed);
        let failed_ops = counters.failed_ops.load(Ordering::Relaxed);
        let total_latency_nanos = counters.total_latency_nanos.load(Ordering::Relaxed);

        let attempted = total_ops + failed_ops;
        let failure_rate = if attempted > 0 {
            failed_ops as f64 / attempted as f64
        } else {
            0.0
        };
        let avg_latency_ms = if total_ops > 0 {
            total_latency_nanos as f64 / total_ops as f64 / 1_000_000.0
        } else {
            0.0
        };
        let overall_ops_rate = reporter::ops_rate(total_ops, 0, elapsed);
        let quantiles = counters.histogram.lock().quantiles();

        let mut series = BTreeMap::new();
        if !time_series.is_empty() {
            series.insert("allCommands".to_string(), time_series);
        }

        let result = BenchmarkResult {
            metadata: self.config.metadata.clone(),
            result_format_version: RESULT_FORMAT_VERSION.to_string(),
            limit: self.config.limit,
            workers: concurrency as u32,
            max_rps: self.config.max_rps,
            db_specific_configs: self.config.db_specific_configs.clone(),
            start_time: start_time.timestamp_millis(),
            end_time: end_time.timestamp_millis(),
            duration_millis: elapsed.as_millis() as i64,
            totals: Totals {
                total_ops,
                failed_ops,
                failure_rate,
                avg_latency_ms,
            },
            overall_rates: OverallRates { overall_ops_rate },
            overall_quantiles: OverallQuantiles {
                all_commands: quantiles,
            },
            time_series: series,
        };

        info!(
            "finished '{}': {total_ops} ops, {overall_ops_rate:.2} ops/sec, avg {:.3}ms",
            self.config.title, avg_latency_ms
        );
        Ok(result)
    }

    /// The CSV row for `result` under this harness's engine and title.
    pub fn csv_row(&self, result: &BenchmarkResult) -> CsvRow {
        CsvRow::from_result(&self.config.engine, &self.config.title, result)
    }
}

/// Issue operations until the deadline or an abort.
fn worker_loop<F>(
    operation: &F,
    counters: &RunCounters,
    end: Option<Instant>,
    policy: ErrorPolicy,
    abort_tx: &Sender<()>,
) where
    F: Fn() -> Result<()> + Sync,
{
    while end.is_none_or(|end| Instant::now() < end) && !counters.is_aborted() {
        let started = Instant::now();
        match operation() {
            Ok(()) => counters.record_success(started.elapsed()),
            Err(error) => match policy {
                ErrorPolicy::Abort => {
                    counters.abort(error);
                    let _ = abort_tx.try_send(());
                    return;
                }
                ErrorPolicy::Count => {
                    debug!("operation failed: {error}");
                    counters.failed_ops.fetch_add(1, Ordering::Relaxed);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn quiet(concurrency: usize, millis: u64) -> BenchmarkConfig {
        BenchmarkConfig::new(concurrency, Duration::from_millis(millis)).without_reporting()
    }

    #[test]
    fn test_noop_run() {
        let bench = Benchmark::new(quiet(1, 100)).unwrap();
        assert_eq!(bench.state(), BenchmarkState::Idle);

        let start = Instant::now();
        let result = bench.run(|| Ok(())).unwrap();

        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(result.throughput() > 0.0);
        assert!(result.totals.total_ops > 0);
        assert_eq!(result.workers, 1);
        assert_eq!(bench.state(), BenchmarkState::Reported);
    }

    #[test]
    fn test_throughput_math_with_fixed_latency() {
        let bench = Benchmark::new(quiet(2, 200)).unwrap();
        let result = bench
            .run(|| {
                thread::sleep(Duration::from_millis(5));
                Ok(())
            })
            .unwrap();

        let expected = result.totals.total_ops as f64 / (result.duration_millis as f64 / 1000.0);
        assert!((result.throughput() - expected).abs() / expected < 0.1);
        assert!(result.avg_latency_ms() >= 5.0);
        assert!(result.avg_latency_ms() < 50.0);
        assert!(result.overall_quantiles.all_commands.q50 >= 5.0);
    }

    #[test]
    fn test_abort_policy_fails_run() {
        let bench = Benchmark::new(quiet(2, 2_000)).unwrap();
        let calls = AtomicUsize::new(0);

        let start = Instant::now();
        let err = bench
            .run(|| {
                if calls.fetch_add(1, Ordering::SeqCst) >= 10 {
                    Err(ShardBenchError::index("backend unavailable"))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();

        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(matches!(err, ShardBenchError::BenchmarkFailed(_)));
        assert!(err.to_string().contains("backend unavailable"));
        assert_eq!(bench.state(), BenchmarkState::Reported);
    }

    #[test]
    fn test_unbounded_duration_runs_until_abort() {
        let config = BenchmarkConfig::new(1, Duration::MAX).without_reporting();
        let bench = Benchmark::new(config).unwrap();
        let calls = AtomicUsize::new(0);

        let err = bench
            .run(|| {
                if calls.fetch_add(1, Ordering::SeqCst) >= 100 {
                    Err(ShardBenchError::index("stop"))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();

        assert!(matches!(err, ShardBenchError::BenchmarkFailed(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 101);
        assert_eq!(bench.state(), BenchmarkState::Reported);
    }

    #[test]
    fn test_count_policy_tracks_failures() {
        let config = quiet(1, 100).with_error_policy(ErrorPolicy::Count);
        let bench = Benchmark::new(config).unwrap();
        let calls = AtomicUsize::new(0);

        let result = bench
            .run(|| {
                if calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                    Err(ShardBenchError::query("bad query"))
                } else {
                    Ok(())
                }
            })
            .unwrap();

        assert!(result.totals.failed_ops > 0);
        assert!(result.failure_rate() > 0.3 && result.failure_rate() < 0.7);
    }

    #[test]
    fn test_counters_reset_between_runs() {
        let bench = Benchmark::new(quiet(1, 50)).unwrap();
        let first = bench.run(|| Ok(())).unwrap();
        let second = bench
            .run(|| {
                thread::sleep(Duration::from_millis(10));
                Ok(())
            })
            .unwrap();

        assert!(second.totals.total_ops < first.totals.total_ops);
        assert!(second.totals.total_ops <= 6);
    }

    #[test]
    fn test_concurrent_run_rejected() {
        let bench = Benchmark::new(quiet(1, 300)).unwrap();

        thread::scope(|s| {
            let running = s.spawn(|| bench.run(|| Ok(())));
            while bench.state() == BenchmarkState::Idle {
                thread::yield_now();
            }
            assert!(bench.run(|| Ok(())).is_err());
            assert!(running.join().unwrap().is_ok());
        });
    }

    #[test]
    fn test_reporter_output() {
        let config = BenchmarkConfig::new(1, Duration::from_millis(120))
            .with_reporting_period(Duration::from_millis(20));
        let bench = Benchmark::new(config).unwrap();

        let mut out = Vec::new();
        let result = bench.run_with_output(|| Ok(()), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Command Rate"));
        assert!(text.contains('%'));
        assert!(!result.time_series["allCommands"].is_empty());
    }
}
