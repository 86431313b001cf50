//! Request metrics and statistics tracking for the prediction service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Process-local metrics for the prediction endpoint.
pub struct ServiceMetrics {
    /// Total prediction requests completed successfully
    pub requests_processed: AtomicU64,
    /// Total failed requests (validation or pipeline errors)
    pub requests_failed: AtomicU64,
    /// Predictions by label
    predictions_by_label: RwLock<HashMap<String, u64>>,
    /// Request processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests_processed: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            predictions_by_label: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record one completed prediction.
    pub fn record_prediction(&self, processing_time: Duration, label: &str, probability: f64) {
        self.requests_processed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only recent samples for memory efficiency
            if times.len() > 10_000 {
                times.drain(0..5_000);
            }
        }

        if let Ok(mut by_label) = self.predictions_by_label.write() {
            *by_label.entry(label.to_string()).or_insert(0) += 1;
        }

        let bucket = (probability * 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a failed request.
    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = match self.processing_times.read() {
            Ok(times) => times,
            Err(_) => return ProcessingStats::default(),
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

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
            self.requests_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_predictions_by_label(&self) -> HashMap<String, u64> {
        self.predictions_by_label
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
            .read()
            .map(|b| *b)
            .unwrap_or([0; 10])
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let processed = self.requests_processed.load(Ordering::Relaxed);
        let failed = self.requests_failed.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let by_label = self.get_predictions_by_label();
        let distribution = self.get_probability_distribution();

        info!(
            processed = processed,
            failed = failed,
            throughput = format!("{:.1} req/s", throughput),
            "Prediction service metrics summary"
        );
        info!(
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            "Request processing time (us)"
        );
        for (label, count) in &by_label {
            let pct = if processed > 0 {
                (*count as f64 / processed as f64) * 100.0
            } else {
                0.0
            };
            info!(label = %label, count = count, pct = format!("{pct:.1}%"), "Predictions by label");
        }

        let total: u64 = distribution.iter().sum();
        if total > 0 {
            for (i, &count) in distribution.iter().enumerate() {
                if count > 0 {
                    info!(
                        bucket = format!("{:.1}-{:.1}", i as f64 / 10.0, (i + 1) as f64 / 10.0),
                        count = count,
                        "Probability distribution"
                    );
                }
            }
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
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

/// Periodic reporter logging a metrics summary.
pub struct MetricsReporter {
    metrics: std::sync::Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
