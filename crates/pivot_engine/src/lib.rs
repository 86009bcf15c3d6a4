//! # Pivot Engine
//!
//! Pure aggregation core: no IO, no shared state. Every function takes its
//! inputs explicitly and returns a fresh snapshot.
//!
//! Responsibilities:
//! - Bucket timestamps by granularity
//! - Resolve one display name per serial ("latest wins")
//! - Join metric records with names into sorted `NormalizedRow`s
//! - Aggregate rows into full / selected time series
//! - Pivot rows into a vehicle × bucket matrix
//! - Page the flat row table
//!
//! ## Usage
//!
//! ```
//! use contracts::{AggregationMode, Granularity, RawMetadataRecord, RawMetricRecord, SelectionSet};
//!
//! let names = pivot_engine::resolve(&[RawMetadataRecord::new("G9-1", "Truck 1", "2024-01-01")]);
//! let rows = pivot_engine::join(
//!     &[RawMetricRecord::new("2024-03-15T10:00:00Z", "G9-1", 42.0)],
//!     &names,
//!     Granularity::Daily,
//! );
//!
//! let series = pivot_engine::build_series(&rows, AggregationMode::Sum, &SelectionSet::new());
//! let matrix = pivot_engine::build_pivot(&rows);
//! assert_eq!(series.full[0].bucket, "2024-03-15");
//! assert_eq!(matrix.vehicles[0].device_name, "Truck 1");
//! ```

mod aggregate;
mod bucket;
mod join;
mod pivot;
mod resolve;
mod table;

#[cfg(test)]
mod proptests;

use tracing::{debug, instrument};

pub use aggregate::aggregate;
pub use bucket::bucket;
pub use join::{join, join_with_stats, JoinStats};
pub use pivot::pivot;
pub use resolve::{newer_timestamp, resolve, resolve_with, NameMap, ResolvedName};
pub use table::{paginate, MAX_PAGE_SIZE};

pub use contracts::{
    AggregationMode, NormalizedRow, PivotMatrix, PivotVehicle, SelectionSet, SeriesPoint,
    SeriesSet, TablePage, VehicleKey,
};

/// Build full and selected series from joined rows
#[instrument(
    name = "pivot_engine_build_series",
    skip(rows, selected),
    fields(rows = rows.len(), selected = selected.len(), mode = ?mode)
)]
pub fn build_series(
    rows: &[NormalizedRow],
    mode: AggregationMode,
    selected: &SelectionSet,
) -> SeriesSet {
    let series = aggregate(rows, mode, selected);
    debug!(
        full_points = series.full.len(),
        selected_points = series.selected.len(),
        "series built"
    );
    series
}

/// Build the pivot matrix from joined rows
#[instrument(name = "pivot_engine_build_pivot", skip(rows), fields(rows = rows.len()))]
pub fn build_pivot(rows: &[NormalizedRow]) -> PivotMatrix {
    let matrix = pivot(rows);
    debug!(
        buckets = matrix.buckets.len(),
        vehicles = matrix.vehicles.len(),
        "pivot built"
    );
    matrix
}
