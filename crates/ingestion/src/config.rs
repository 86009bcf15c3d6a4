//! Drain configuration and cumulative ingestion metrics

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{SourceConfig, DEFAULT_MAX_RECORDS};

/// Paginator limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainConfig {
    /// Stop once more than this many records have been collected
    pub max_records: usize,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

impl DrainConfig {
    /// Create new drain configuration
    pub fn new(max_records: usize) -> Self {
        Self { max_records }
    }
}

impl From<&SourceConfig> for DrainConfig {
    fn from(config: &SourceConfig) -> Self {
        Self::new(config.max_records)
    }
}

/// Ingestion metrics, shared across query cycles
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Query cycles started
    pub queries: AtomicU64,

    /// Pages fetched
    pub pages_fetched: AtomicU64,

    /// Records fetched
    pub records_fetched: AtomicU64,

    /// Drains cut short by the safety cap
    pub truncated_drains: AtomicU64,

    /// Failed query cycles
    pub failed_queries: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a query cycle start
    #[inline]
    pub fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished drain
    #[inline]
    pub fn record_drain(&self, pages: usize, records: usize) {
        self.pages_fetched.fetch_add(pages as u64, Ordering::Relaxed);
        self.records_fetched
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    /// Record a truncated drain
    #[inline]
    pub fn record_truncated(&self) {
        self.truncated_drains.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed cycle
    #[inline]
    pub fn record_failure(&self) {
        self.failed_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Get metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries: self.queries.load(Ordering::Relaxed),
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            records_fetched: self.records_fetched.load(Ordering::Relaxed),
            truncated_drains: self.truncated_drains.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub queries: u64,
    pub pages_fetched: u64,
    pub records_fetched: u64,
    pub truncated_drains: u64,
    pub failed_queries: u64,
}
