use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Operations slower than this are logged at warn level
const SLOW_OPERATION: Duration = Duration::from_millis(500);

/// Breed lookup counters
#[derive(Debug, Default)]
pub struct BreedLookupMetrics {
    pub upstream_requests: AtomicU64,
    pub upstream_errors: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub rejected_breeds: AtomicU64,
}

impl BreedLookupMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.upstream_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.upstream_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejected_breeds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> BreedLookupStats {
        BreedLookupStats {
            upstream_requests: self.upstream_requests.load(Ordering::Relaxed),
            upstream_errors: self.upstream_errors.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            rejected_breeds: self.rejected_breeds.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            upstream_requests = stats.upstream_requests,
            upstream_errors = stats.upstream_errors,
            cache_hits = stats.cache_hits,
            cache_misses = stats.cache_misses,
            rejected_breeds = stats.rejected_breeds,
            "Breed lookup metrics"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreedLookupStats {
    pub upstream_requests: u64,
    pub upstream_errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub rejected_breeds: u64,
}

static BREED_METRICS: std::sync::LazyLock<BreedLookupMetrics> =
    std::sync::LazyLock::new(BreedLookupMetrics::new);

/// Process-wide breed lookup metrics
pub fn breed_metrics() -> &'static BreedLookupMetrics {
    &BREED_METRICS
}

/// Logs how long an operation took when dropped
pub struct OperationTimer {
    operation: &'static str,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        if duration >= SLOW_OPERATION {
            warn!(
                operation = self.operation,
                duration_ms = duration.as_millis() as u64,
                "Slow operation"
            );
        } else {
            tracing::debug!(
                operation = self.operation,
                duration_ms = duration.as_millis() as u64,
                "Operation completed"
            );
        }
    }
}

#[macro_export]
macro_rules! time_operation {
    ($operation:expr) => {
        let _timer = $crate::observability::OperationTimer::new($operation);
    };
}
