//! Session statistics across repeated queries.

use std::time::Duration;

use contracts::{ErrorClass, QueryStats};
use ingestion::MetricsSnapshot;
use observability::QueryStatsAggregator;

/// Statistics from one CLI invocation
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Wall time of all runs
    pub duration: Duration,

    /// Source counters at the end of the session
    pub ingestion: MetricsSnapshot,

    /// Per-query aggregation
    pub queries: QueryStatsAggregator,
}

impl SessionStats {
    pub fn record(&mut self, stats: &QueryStats) {
        self.queries.update(stats);
    }

    pub fn record_failure(&mut self, class: ErrorClass) {
        self.queries.record_failure(class);
    }

    /// Queries per second over the session
    pub fn qps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.queries.total_queries as f64 / secs
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Session Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Queries/s: {:.2}", self.qps());
        println!("   ├─ Pages fetched: {}", self.ingestion.pages_fetched);
        println!("   ├─ Records fetched: {}", self.ingestion.records_fetched);
        println!("   └─ Truncated drains: {}", self.ingestion.truncated_drains);

        println!("\n📈 Query Metrics");
        for line in self.queries.summary().to_string().lines().skip(1) {
            println!("   {line}");
        }

        println!();
    }
}
