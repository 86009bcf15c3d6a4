//! Row joining - metric records + resolved names → normalized rows

use contracts::{Granularity, NormalizedRow, RawMetricRecord};
use metrics::counter;
use tracing::{debug, instrument};

use crate::bucket::bucket;
use crate::resolve::NameMap;

/// Counts of records rejected during a join
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub accepted: usize,
    pub missing_serial: usize,
    pub missing_value: usize,
    pub empty_bucket: usize,
}

impl JoinStats {
    pub fn dropped(&self) -> usize {
        self.missing_serial + self.missing_value + self.empty_bucket
    }
}

/// Join records with names, discarding the statistics
pub fn join(
    records: &[RawMetricRecord],
    names: &NameMap,
    granularity: Granularity,
) -> Vec<NormalizedRow> {
    join_with_stats(records, names, granularity).0
}

/// Join records with names
///
/// Drops records with an empty serial, a null or non-numeric value, or an
/// empty bucket. The device name falls back to the serial when the serial has
/// no (or an empty) resolved name. Output is sorted by `(bucket, device_name)`
/// with a stable sort, so equal keys keep source order.
#[instrument(
    name = "pivot_engine_join",
    skip(records, names),
    fields(records = records.len(), names = names.len(), granularity = %granularity)
)]
pub fn join_with_stats(
    records: &[RawMetricRecord],
    names: &NameMap,
    granularity: Granularity,
) -> (Vec<NormalizedRow>, JoinStats) {
    let mut stats = JoinStats::default();
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let serial = record.serial.trim();
        if serial.is_empty() {
            stats.missing_serial += 1;
            continue;
        }

        let Some(value) = record.value.as_ref().and_then(|v| v.as_finite()) else {
            stats.missing_value += 1;
            continue;
        };

        let bucket = bucket(&record.timestamp, granularity);
        if bucket.is_empty() {
            stats.empty_bucket += 1;
            continue;
        }

        let device_name = names
            .get(serial)
            .map(|n| n.display_name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(serial);

        rows.push(NormalizedRow {
            bucket: bucket.to_string(),
            device_serial: serial.to_string(),
            device_name: device_name.to_string(),
            value,
        });
    }

    rows.sort_by(|a, b| {
        a.bucket
            .cmp(&b.bucket)
            .then_with(|| a.device_name.cmp(&b.device_name))
    });
    stats.accepted = rows.len();

    record_join_metrics(&stats);
    debug!(
        accepted = stats.accepted,
        missing_serial = stats.missing_serial,
        missing_value = stats.missing_value,
        empty_bucket = stats.empty_bucket,
        "join finished"
    );

    (rows, stats)
}

fn record_join_metrics(stats: &JoinStats) {
    for (reason, count) in [
        ("missing_serial", stats.missing_serial),
        ("missing_value", stats.missing_value),
        ("empty_bucket", stats.empty_bucket),
    ] {
        if count > 0 {
            counter!("fleetview_rows_dropped_total", "reason" => reason).increment(count as u64);
        }
    }
}
