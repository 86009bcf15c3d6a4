//! Time-series aggregation over normalized rows

use std::collections::{BTreeMap, BTreeSet};

use contracts::{AggregationMode, NormalizedRow, SelectionSet, SeriesPoint, SeriesSet};

/// Running `{sum, count}` for one bucket
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Accumulator {
    sum: f64,
    count: u64,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn finish(self, mode: AggregationMode) -> f64 {
        match mode {
            AggregationMode::Sum => self.sum,
            AggregationMode::Average if self.count == 0 => 0.0,
            AggregationMode::Average => self.sum / self.count as f64,
        }
    }
}

/// Build the full-population series and the selected-subset overlay
///
/// An empty selection means "no subset": the selected series is empty and
/// the second pass is skipped. Selection keys that match no row are inert.
/// Both series ascend by bucket.
pub fn aggregate(
    rows: &[NormalizedRow],
    mode: AggregationMode,
    selected: &SelectionSet,
) -> SeriesSet {
    let full = series(accumulate(rows.iter()), mode);

    let selected = if selected.is_empty() {
        Vec::new()
    } else {
        let keys: BTreeSet<(&str, &str)> = selected
            .iter()
            .map(|key| (key.device_name.as_str(), key.device_serial.as_str()))
            .collect();
        let chosen = rows.iter().filter(|row| {
            keys.contains(&(row.device_name.as_str(), row.device_serial.as_str()))
        });
        series(accumulate(chosen), mode)
    };

    SeriesSet { full, selected }
}

fn accumulate<'a>(
    rows: impl Iterator<Item = &'a NormalizedRow>,
) -> BTreeMap<&'a str, Accumulator> {
    let mut buckets: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for row in rows {
        buckets.entry(row.bucket.as_str()).or_default().push(row.value);
    }
    buckets
}

fn series(buckets: BTreeMap<&str, Accumulator>, mode: AggregationMode) -> Vec<SeriesPoint> {
    buckets
        .into_iter()
        .map(|(bucket, acc)| SeriesPoint {
            bucket: bucket.to_string(),
            value: acc.finish(mode),
        })
        .collect()
}
