//! Query accounting and latency tracking for oracles.
//!
//! [`OracleStats`] wraps any [`Oracle`] and counts the texts it scores, the
//! calls made to it, and the latency of each call over a sliding window of
//! recent samples. Percentiles are computed on demand from a sorted snapshot.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use wordbug_core::{Oracle, Prediction, Result};

/// Default number of call latencies to retain.
pub const DEFAULT_MAX_SAMPLES: usize = 1000;

/// Snapshot of an oracle's usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryStats {
    /// Texts scored, counting each text of a batch.
    pub queries: usize,
    /// Oracle calls made (single or batch).
    pub calls: usize,
    /// Calls that returned an error.
    pub errors: usize,
    /// Median call latency.
    pub p50: Duration,
    /// 95th percentile call latency.
    pub p95: Duration,
    /// 99th percentile call latency.
    pub p99: Duration,
    /// Minimum observed call latency.
    pub min: Duration,
    /// Maximum observed call latency.
    pub max: Duration,
    /// Arithmetic mean call latency.
    pub mean: Duration,
}

/// An [`Oracle`] wrapper that records usage.
///
/// # Example
///
/// ```
/// use wordbug_attack::{LexiconOracle, OracleStats};
/// use wordbug_core::Oracle;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let oracle = OracleStats::new(LexiconOracle::sentiment());
/// oracle.predict("what a great film").await.unwrap();
/// assert_eq!(oracle.queries(), 1);
/// # }
/// ```
pub struct OracleStats<O> {
    inner: O,
    queries: AtomicUsize,
    calls: AtomicUsize,
    errors: AtomicUsize,
    latencies: Mutex<LatencyWindow>,
}

struct LatencyWindow {
    durations: VecDeque<Duration>,
    max_samples: usize,
}

impl<O: Oracle> OracleStats<O> {
    /// Wrap `inner` with the default latency window.
    #[must_use]
    pub fn new(inner: O) -> Self {
        Self::with_window(inner, DEFAULT_MAX_SAMPLES)
    }

    /// Wrap `inner`, keeping the latest `max_samples` call latencies.
    #[must_use]
    pub fn with_window(inner: O, max_samples: usize) -> Self {
        Self {
            inner,
            queries: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            latencies: Mutex::new(LatencyWindow {
                durations: VecDeque::with_capacity(max_samples.min(DEFAULT_MAX_SAMPLES)),
                max_samples: max_samples.max(1),
            }),
        }
    }

    /// The wrapped oracle.
    #[must_use]
    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Texts scored so far.
    #[must_use]
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    /// Usage snapshot. Latency fields are zero before the first call.
    #[must_use]
    pub fn stats(&self) -> QueryStats {
        let mut sorted: Vec<Duration> = {
            let window = self.latencies.lock().unwrap_or_else(|e| e.into_inner());
            window.durations.iter().copied().collect()
        };
        sorted.sort();

        let (min, max, mean) = match (sorted.first(), sorted.last()) {
            (Some(&min), Some(&max)) => {
                let total: Duration = sorted.iter().sum();
                (min, max, total / sorted.len() as u32)
            }
            _ => (Duration::ZERO, Duration::ZERO, Duration::ZERO),
        };

        QueryStats {
            queries: self.queries(),
            calls: self.calls.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
            min,
            max,
            mean,
        }
    }

    fn record<T>(&self, texts: usize, started: Instant, outcome: &Result<T>) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if outcome.is_ok() {
            self.queries.fetch_add(texts, Ordering::Relaxed);
        } else {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        let mut window = self.latencies.lock().unwrap_or_else(|e| e.into_inner());
        if window.durations.len() >= window.max_samples {
            window.durations.pop_front();
        }
        window.durations.push_back(started.elapsed());
    }
}

#[async_trait]
impl<O: Oracle> Oracle for OracleStats<O> {
    async fn predict(&self, text: &str) -> Result<Prediction> {
        let started = Instant::now();
        let outcome = self.inner.predict(text).await;
        self.record(1, started, &outcome);
        outcome
    }

    async fn predict_batch(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        let started = Instant::now();
        let outcome = self.inner.predict_batch(texts).await;
        self.record(texts.len(), started, &outcome);
        outcome
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Nearest-rank percentile of a sorted slice.
fn percentile(sorted: &[Duration], pct: f64) -> Duration {
    match sorted.len() {
        0 => Duration::ZERO,
        1 => sorted[0],
        n => {
            let idx = ((pct / 100.0) * (n - 1) as f64).round() as usize;
            sorted[idx.min(n - 1)]
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
