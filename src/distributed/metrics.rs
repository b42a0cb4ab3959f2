//! Metrics collection for distributed reads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Snapshot of distributed read metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistributedMetrics {
    /// Search fan-outs executed.
    pub total_searches: u64,

    /// Suggest fan-outs executed.
    pub total_suggests: u64,

    /// Fan-outs where at least one shard failed.
    pub failed_requests: u64,

    /// Individual shard failures across all fan-outs.
    pub shard_errors: u64,

    /// Fan-outs that hit the shard timeout.
    pub timeout_count: u64,

    /// Total time spent in fan-outs.
    pub total_latency: Duration,

    /// Average fan-out latency.
    pub avg_latency: Duration,

    /// Slowest fan-out observed.
    pub max_latency: Duration,
}

/// Thread-safe collector for distributed read metrics.
#[derive(Debug)]
pub struct DistributedMetricsCollector {
    total_searches: AtomicU64,
    total_suggests: AtomicU64,
    failed_requests: AtomicU64,
    shard_errors: AtomicU64,
    timeout_count: AtomicU64,
    total_latency_nanos: AtomicU64,
    max_latency_nanos: AtomicU64,

    /// Start time for the collector.
    start_time: Instant,
}

/// Kind of read being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadKind {
    Search,
    Suggest,
}

impl DistributedMetricsCollector {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            total_searches: AtomicU64::new(0),
            total_suggests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            shard_errors: AtomicU64::new(0),
            timeout_count: AtomicU64::new(0),
            total_latency_nanos: AtomicU64::new(0),
            max_latency_nanos: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one fan-out.
    pub fn record(&self, kind: ReadKind, latency: Duration, shard_errors: usize, timed_out: bool) {
        match kind {
            ReadKind::Search => self.total_searches.fetch_add(1, Ordering::Relaxed),
            ReadKind::Suggest => self.total_suggests.fetch_add(1, Ordering::Relaxed),
        };

        if shard_errors > 0 {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
            self.shard_errors
                .fetch_add(shard_errors as u64, Ordering::Relaxed);
        }
        if timed_out {
            self.timeout_count.fetch_add(1, Ordering::Relaxed);
        }

        let nanos = latency.as_nanos().min(u64::MAX as u128) as u64;
        self.total_latency_nanos.fetch_add(nanos, Ordering::Relaxed);

        // Update max latency
        loop {
            let current_max = self.max_latency_nanos.load(Ordering::Relaxed);
            if nanos <= current_max {
                break;
            }
            if self
                .max_latency_nanos
                .compare_exchange_weak(current_max, nanos, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }
    }

    /// Get the current metrics snapshot.
    pub fn snapshot(&self) -> DistributedMetrics {
        let total_searches = self.total_searches.load(Ordering::Relaxed);
        let total_suggests = self.total_suggests.load(Ordering::Relaxed);
        let total_nanos = self.total_latency_nanos.load(Ordering::Relaxed);

        let requests = total_searches + total_suggests;
        let avg_nanos = if requests > 0 {
            total_nanos / requests
        } else {
            0
        };

        DistributedMetrics {
            total_searches,
            total_suggests,
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            shard_errors: self.shard_errors.load(Ordering::Relaxed),
            timeout_count: self.timeout_count.load(Ordering::Relaxed),
            total_latency: Duration::from_nanos(total_nanos),
            avg_latency: Duration::from_nanos(avg_nanos),
            max_latency: Duration::from_nanos(self.max_latency_nanos.load(Ordering::Relaxed)),
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        self.total_searches.store(0, Ordering::Relaxed);
        self.total_suggests.store(0, Ordering::Relaxed);
        self.failed_requests.store(0, Ordering::Relaxed);
        self.shard_errors.store(0, Ordering::Relaxed);
        self.timeout_count.store(0, Ordering::Relaxed);
        self.total_latency_nanos.store(0, Ordering::Relaxed);
        self.max_latency_nanos.store(0, Ordering::Relaxed);
    }

    /// Get the uptime of this collector.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for DistributedMetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
