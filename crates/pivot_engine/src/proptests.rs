use std::collections::{BTreeMap, BTreeSet};

use contracts::{AggregationMode, Granularity, NormalizedRow, RawMetricRecord, SelectionSet};
use proptest::prelude::*;

use crate::{aggregate, bucket, join, pivot, NameMap};

prop_compose! {
    /// Rows over a small key space so buckets and vehicles collide often
    fn arb_row()(
        day in 1u32..=6,
        name in prop::sample::select(vec!["Alpha", "Bravo", "Truck, A", "\"Quoted\""]),
        serial in prop::sample::select(vec!["S1", "S2", "S3"]),
        value in -1_000.0f64..1_000.0,
    ) -> NormalizedRow {
        NormalizedRow {
            bucket: format!("2024-01-{day:02}"),
            device_serial: serial.to_string(),
            device_name: name.to_string(),
            value,
        }
    }
}

fn arb_rows() -> impl Strategy<Value = Vec<NormalizedRow>> {
    prop::collection::vec(arb_row(), 0..200)
}

proptest! {
    /// Property: pivot buckets are exactly the sorted distinct row buckets
    #[test]
    fn prop_pivot_buckets_distinct_sorted(rows in arb_rows()) {
        let expected: Vec<String> = rows
            .iter()
            .map(|r| r.bucket.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        prop_assert_eq!(pivot(&rows).buckets, expected);
    }

    /// Property: per vehicle, pivot cells sum to the vehicle's row total
    #[test]
    fn prop_pivot_conserves_totals(rows in arb_rows()) {
        let mut expected: BTreeMap<_, f64> = BTreeMap::new();
        for row in &rows {
            *expected.entry(row.vehicle_key()).or_default() += row.value;
        }

        let matrix = pivot(&rows);
        prop_assert_eq!(matrix.vehicles.len(), expected.len());
        for vehicle in &matrix.vehicles {
            let want = expected[&vehicle.key];
            prop_assert!((vehicle.total() - want).abs() < 1e-6, "{} != {}", vehicle.total(), want);
        }
    }

    /// Property: selecting every vehicle in sum mode reproduces the full series
    #[test]
    fn prop_select_all_equals_full(rows in arb_rows()) {
        let all: SelectionSet = rows.iter().map(|r| r.vehicle_key()).collect();
        let set = aggregate(&rows, AggregationMode::Sum, &all);
        prop_assert_eq!(set.selected, set.full);
    }

    /// Property: empty selection gives an empty overlay
    #[test]
    fn prop_empty_selection_empty_overlay(rows in arb_rows()) {
        let set = aggregate(&rows, AggregationMode::Average, &SelectionSet::new());
        prop_assert!(set.selected.is_empty());
    }

    /// Property: selected buckets are a subset of full buckets
    #[test]
    fn prop_selected_buckets_subset(rows in arb_rows(), pick in 0usize..4) {
        let keys: Vec<_> = rows.iter().map(|r| r.vehicle_key()).collect();
        let selected: SelectionSet = keys.into_iter().take(pick).collect();
        let set = aggregate(&rows, AggregationMode::Sum, &selected);
        let full: BTreeSet<_> = set.full.iter().map(|p| &p.bucket).collect();
        for point in &set.selected {
            prop_assert!(full.contains(&point.bucket));
        }
    }

    /// Property: series buckets ascend strictly
    #[test]
    fn prop_series_ascending(rows in arb_rows()) {
        let set = aggregate(&rows, AggregationMode::Sum, &SelectionSet::new());
        for pair in set.full.windows(2) {
            prop_assert!(pair[0].bucket < pair[1].bucket);
        }
    }

    /// Property: a bucket is always a prefix of its timestamp
    #[test]
    fn prop_bucket_is_prefix(ts in "[0-9T:Z-]{0,25}") {
        for granularity in [Granularity::Daily, Granularity::Monthly] {
            let b = bucket(&ts, granularity);
            prop_assert!(ts.starts_with(b));
            prop_assert!(b.len() <= granularity.prefix_len());
        }
    }

    /// Property: join output is ordered by (bucket, device_name)
    #[test]
    fn prop_join_sorted(
        samples in prop::collection::vec((1u32..=28, 1u32..=5, prop::option::of(0.0f64..500.0)), 0..100),
    ) {
        let records: Vec<_> = samples
            .iter()
            .map(|(day, device, value)| RawMetricRecord {
                timestamp: format!("2024-02-{day:02}T12:00:00Z"),
                serial: format!("S{device}"),
                value: value.map(Into::into),
            })
            .collect();
        let rows = join(&records, &NameMap::new(), Granularity::Daily);
        prop_assert_eq!(rows.len(), samples.iter().filter(|(_, _, v)| v.is_some()).count());
        for pair in rows.windows(2) {
            let a = (&pair[0].bucket, &pair[0].device_name);
            let b = (&pair[1].bucket, &pair[1].device_name);
            prop_assert!(a <= b);
        }
    }
}
