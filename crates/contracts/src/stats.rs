//! QueryStats - per-cycle run statistics
//!
//! Produced by the query runner, consumed by observability and the CLI.

use serde::{Deserialize, Serialize};

/// Statistics of one query cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryStats {
    /// Pages fetched from the record source
    pub pages_fetched: usize,

    /// Raw records collected
    pub records_fetched: usize,

    /// Drain stopped at the safety cap
    pub truncated: bool,

    /// Metadata records received
    pub metadata_records: usize,

    /// Distinct serials seen in the raw records
    pub devices: usize,

    /// Rows that survived the join
    pub rows_joined: usize,

    /// Records rejected by the join
    pub rows_dropped: usize,

    /// Wall time of the cycle (milliseconds)
    pub duration_ms: f64,
}
