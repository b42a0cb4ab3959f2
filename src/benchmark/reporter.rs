//! Periodic progress reporting for running benchmarks.

use std::io::Write;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam_channel::{Receiver, select, tick};

use crate::benchmark::harness::RunCounters;
use crate::benchmark::result::DataPoint;

/// Column header printed once before the progress lines.
pub fn format_header() -> String {
    format!(
        "{:>26} {:>7} {:>25} {:>25} {:>25}",
        "Test time", " ", "Command Rate", "Client p50 with RTT(ms)", "Total Commands"
    )
}

/// One fixed-width progress line, without the trailing carriage return.
pub fn format_progress_line(
    elapsed: Duration,
    completion_percent: f64,
    ops_rate: f64,
    p50_ms: f64,
    total_ops: u64,
) -> String {
    let completion = format!("[{completion_percent:3.1}%]");
    format!(
        "{:>25.0}s {:>7} {:>25.2} {:>25.3} {:>25}",
        elapsed.as_secs_f64(),
        completion,
        ops_rate,
        p50_ms,
        total_ops
    )
}

/// Share of `total` covered by `elapsed`, in percent, capped at 100.
pub fn completion_percent(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 100.0;
    }
    (elapsed.as_secs_f64() / total.as_secs_f64() * 100.0).min(100.0)
}

/// Operations per second between two counter readings.
pub fn ops_rate(current: u64, previous: u64, took: Duration) -> f64 {
    let secs = took.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    current.saturating_sub(previous) as f64 / secs
}

/// Print progress every `period` until `stop` fires or disconnects.
///
/// Returns one data point per tick.
pub(crate) fn run(
    period: Duration,
    start: Instant,
    total: Duration,
    counters: &RunCounters,
    stop: Receiver<()>,
    out: &mut dyn Write,
) -> Vec<DataPoint> {
    let ticker = tick(period);
    let mut points = Vec::new();
    let mut prev_time = start;
    let mut prev_ops = 0;

    let _ = writeln!(out, "{}", format_header());

    loop {
        select! {
            recv(stop) -> _ => break,
            recv(ticker) -> msg => {
                let Ok(now) = msg else { break };

                let current = counters.total_ops.load(Ordering::Relaxed);
                let rate = ops_rate(current, prev_ops, now.duration_since(prev_time));
                let p50 = counters.histogram.lock().value_at_quantile_ms(0.5);
                let elapsed = now.duration_since(start);

                let line = format_progress_line(
                    elapsed,
                    completion_percent(elapsed, total),
                    rate,
                    p50,
                    current,
                );
                let _ = write!(out, "{line}\r");
                let _ = out.flush();

                points.push(
                    DataPoint::new(Utc::now().timestamp_millis())
                        .with_value("opsRate", rate)
                        .with_value("p50LatencyMs", p50)
                        .with_value("totalOps", current as f64),
                );

                prev_ops = current;
                prev_time = now;
            }
        }
    }

    let _ = writeln!(out);
    points
}
