//! Performance metrics and statistics tracking for the prediction service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Width of one predicted price bucket
const PRICE_BUCKET_WIDTH: i64 = 100_000;
/// Number of price buckets; the last one is open-ended
const PRICE_BUCKETS: usize = 12;

/// Metrics collector for service performance
pub struct PipelineMetrics {
    /// Total requests answered with a price
    pub predictions_served: AtomicU64,
    /// Total requests answered with an error
    pub predictions_failed: AtomicU64,
    /// Failures by error kind
    failures_by_kind: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Predicted price distribution buckets
    price_buckets: RwLock<[u64; PRICE_BUCKETS]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            predictions_failed: AtomicU64::new(0),
            failures_by_kind: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            price_buckets: RwLock::new([0; PRICE_BUCKETS]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, processing_time: Duration, price: i64) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        self.record_processing_time(processing_time);

        let bucket = price_bucket(price);
        if let Ok(mut buckets) = self.price_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a failed prediction
    pub fn record_failure(&self, processing_time: Duration, kind: &str) {
        self.predictions_failed.fetch_add(1, Ordering::Relaxed);
        self.record_processing_time(processing_time);

        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    fn record_processing_time(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Total requests handled
    pub fn total_requests(&self) -> u64 {
        self.predictions_served.load(Ordering::Relaxed) + self.predictions_failed.load(Ordering::Relaxed)
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let Ok(times) = self.processing_times.read() else {
            return ProcessingStats::default();
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_requests() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get predicted price distribution
    pub fn get_price_distribution(&self) -> [u64; PRICE_BUCKETS] {
        self.price_buckets
            .read()
            .map(|b| *b)
            .unwrap_or([0; PRICE_BUCKETS])
    }

    /// Get failures by error kind
    pub fn get_failures_by_kind(&self) -> HashMap<String, u64> {
        self.failures_by_kind
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let failed = self.predictions_failed.load(Ordering::Relaxed);
        let total = served + failed;
        let failure_rate = if total > 0 {
            (failed as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let failures_by_kind = self.get_failures_by_kind();
        let price_dist = self.get_price_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║          RESALE PRICE PREDICTOR - METRICS SUMMARY            ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Predictions Served:     {:>8}  │  Throughput: {:>6.1} req/s ║",
            served, throughput
        );
        info!(
            "║ Predictions Failed:     {:>8}  │  Failure Rate: {:>5.1}%    ║",
            failed, failure_rate
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        if !failures_by_kind.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Failures by Kind:                                            ║");
            for (kind, count) in &failures_by_kind {
                info!("║   {:20}: {:>6}                                ║", kind, count);
            }
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Predicted Price Distribution (SGD):                          ║");
        for (i, &count) in price_dist.iter().enumerate() {
            let pct = if served > 0 { (count as f64 / served as f64) * 100.0 } else { 0.0 };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!("║   {:>14}: {:>6} ({:>5.1}%) {}", bucket_label(i), count, pct, bar);
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn price_bucket(price: i64) -> usize {
    ((price.max(0) / PRICE_BUCKET_WIDTH) as usize).min(PRICE_BUCKETS - 1)
}

fn bucket_label(bucket: usize) -> String {
    let low = bucket as i64 * PRICE_BUCKET_WIDTH / 1000;
    if bucket == PRICE_BUCKETS - 1 {
        format!("{low}k+")
    } else {
        format!("{}k-{}k", low, low + PRICE_BUCKET_WIDTH / 1000)
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // the first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
