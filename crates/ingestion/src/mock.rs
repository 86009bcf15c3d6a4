//! Mock 车队数据生成器
//!
//! 用于无外部数据源环境的测试和演示。生成结果完全确定：相同配置总是得到相同数据集。

use std::collections::BTreeSet;

use chrono::{Days, Months};
use contracts::{MockSourceConfig, RawMetadataRecord, RawMetricRecord};

use crate::fixture::{Dataset, GroupDefinition, MetricTables};

const PLATE_LETTERS: &[u8] = b"BCDFGHJKLMNPRSTVWXYZ";

/// 第 `index` 辆车的序列号
pub fn serial(index: usize) -> String {
    format!("G9-MCK-{:03}", index + 1)
}

/// 车牌风格的显示名，例如 `1234BCD`
fn plate(index: usize) -> String {
    let digits = 1000 + (index * 137) % 9000;
    let letter = |n: usize| PLATE_LETTERS[n % PLATE_LETTERS.len()] as char;
    format!(
        "{digits:04}{}{}{}",
        letter(index / 400),
        letter(index / 20),
        letter(index)
    )
}

/// 生成数据集
///
/// - 每辆车每天 `samples_per_day` 条距离和油耗记录
/// - 每第 3 辆车有一条更早的改名记录（验证 "latest wins"）
/// - 每第 5 辆车没有元数据（显示名回退为序列号）
/// - 分组：g1 Madrid（偶数下标），g2 Barcelona（奇数下标），g3 Valencia（空）
pub fn generate(config: &MockSourceConfig) -> Dataset {
    let samples = config.samples_per_day.max(1) as usize;
    let capacity = config.vehicles * config.days as usize * samples;
    let mut distance = Vec::with_capacity(capacity);
    let mut fuel = Vec::with_capacity(capacity);

    for day in 0..config.days {
        let Some(date) = config.start.checked_add_days(Days::new(u64::from(day))) else {
            break;
        };
        let date = date.format("%Y-%m-%d").to_string();

        for vehicle in 0..config.vehicles {
            for sample in 0..samples {
                let minutes = 360 + sample * (1080 / samples);
                let timestamp = format!("{date}T{:02}:{:02}:00Z", minutes / 60, minutes % 60);
                let seed = vehicle * 31 + day as usize * 17 + sample * 7;
                let km = 20.0 + (seed % 97) as f64 * 1.25;
                let litres = km * (0.08 + (vehicle % 4) as f64 * 0.01);

                distance.push(RawMetricRecord::new(&timestamp, serial(vehicle), km));
                fuel.push(RawMetricRecord::new(
                    &timestamp,
                    serial(vehicle),
                    (litres * 100.0).round() / 100.0,
                ));
            }
        }
    }

    let registered = config.start.format("%Y-%m-%d").to_string();
    let renamed_from = config
        .start
        .checked_sub_months(Months::new(12))
        .unwrap_or(config.start)
        .format("%Y-%m-%d")
        .to_string();

    let mut metadata = Vec::new();
    for vehicle in 0..config.vehicles {
        if vehicle % 5 == 4 {
            continue;
        }
        if vehicle % 3 == 0 {
            metadata.push(RawMetadataRecord::new(
                serial(vehicle),
                format!("OLD-{}", plate(vehicle)),
                &renamed_from,
            ));
        }
        metadata.push(RawMetadataRecord::new(serial(vehicle), plate(vehicle), &registered));
    }

    let members = |parity: usize| -> BTreeSet<String> {
        (0..config.vehicles)
            .filter(|v| v % 2 == parity)
            .map(serial)
            .collect()
    };
    let groups = vec![
        GroupDefinition {
            id: "g1".to_string(),
            name: "Madrid".to_string(),
            serials: members(0),
        },
        GroupDefinition {
            id: "g2".to_string(),
            name: "Barcelona".to_string(),
            serials: members(1),
        },
        GroupDefinition {
            id: "g3".to_string(),
            name: "Valencia".to_string(),
            serials: BTreeSet::new(),
        },
    ];

    Dataset {
        records: MetricTables { distance, fuel },
        metadata,
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn config(vehicles: usize, days: u32) -> MockSourceConfig {
        MockSourceConfig {
            vehicles,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            days,
            samples_per_day: 2,
            fail_on_page: None,
        }
    }

    #[test]
    fn test_record_counts() {
        let dataset = generate(&config(4, 10));
        assert_eq!(dataset.records.distance.len(), 4 * 10 * 2);
        assert_eq!(dataset.records.fuel.len(), 4 * 10 * 2);
    }

    #[test]
    fn test_deterministic() {
        let a = generate(&config(6, 5));
        let b = generate(&config(6, 5));
        assert_eq!(a.records.distance, b.records.distance);
        assert_eq!(a.metadata, b.metadata);
    }

    #[test]
    fn test_timestamps_are_iso_utc() {
        let dataset = generate(&config(1, 2));
        assert_eq!(dataset.records.distance[0].timestamp, "2024-01-01T06:00:00Z");
        assert_eq!(dataset.records.distance[1].timestamp, "2024-01-01T15:00:00Z");
        assert_eq!(dataset.records.distance[2].timestamp, "2024-01-02T06:00:00Z");
    }

    #[test]
    fn test_metadata_renames_and_gaps() {
        let dataset = generate(&config(5, 1));
        let for_serial = |s: &str| dataset.metadata.iter().filter(|m| m.serial == s).count();
        assert_eq!(for_serial(&serial(0)), 2);
        assert_eq!(for_serial(&serial(1)), 1);
        assert_eq!(for_serial(&serial(4)), 0);
    }

    #[test]
    fn test_groups_partition_fleet() {
        let dataset = generate(&config(5, 1));
        assert_eq!(dataset.groups[0].serials.len(), 3);
        assert_eq!(dataset.groups[1].serials.len(), 2);
        assert!(dataset.groups[2].serials.is_empty());
    }

    #[test]
    fn test_plates_unique_for_small_fleets() {
        let plates: BTreeSet<_> = (0..200).map(plate).collect();
        assert_eq!(plates.len(), 200);
    }
}
