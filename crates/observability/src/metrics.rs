//! 查询指标收集模块
//!
//! 基于 QueryStats 记录单次查询指标，并在内存中汇总多次查询。

use std::collections::BTreeMap;

use contracts::{ErrorClass, QueryStats};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, Unit};

/// 注册所有 fleetview 指标的描述
pub fn describe_metrics() {
    describe_counter!("fleetview_pages_fetched_total", "Pages fetched from record sources");
    describe_counter!(
        "fleetview_records_fetched_total",
        "Raw metric records fetched from record sources"
    );
    describe_counter!(
        "fleetview_rows_dropped_total",
        "Records rejected by the join, by reason"
    );
    describe_gauge!("fleetview_rows_joined", "Rows produced by the latest join");
    describe_histogram!(
        "fleetview_query_duration_ms",
        Unit::Milliseconds,
        "Wall time of one query cycle"
    );
    describe_counter!("fleetview_exports_total", "CSV exports rendered, by layout and status");
    describe_counter!(
        "fleetview_sink_deliveries_total",
        "Export deliveries, by sink and status"
    );
    describe_counter!("fleetview_queries_total", "Query cycles, by status");
    describe_counter!(
        "fleetview_queries_truncated_total",
        "Query cycles stopped at the record cap"
    );
    describe_gauge!("fleetview_query_devices", "Distinct devices in the latest query");
}

/// 记录一次成功查询
///
/// 查询耗时与行数由 ingestion 在查询过程中记录，这里只记录结果维度。
pub fn record_query_outcome(stats: &QueryStats) {
    counter!("fleetview_queries_total", "status" => "ok").increment(1);
    gauge!("fleetview_query_devices").set(stats.devices as f64);
    if stats.truncated {
        counter!("fleetview_queries_truncated_total").increment(1);
    }
}

/// 记录一次失败查询
pub fn record_query_failure(class: ErrorClass) {
    counter!("fleetview_queries_total", "status" => class.as_str()).increment(1);
}

/// 查询指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct QueryStatsAggregator {
    /// 成功查询数
    pub total_queries: u64,

    /// 失败查询数（按错误类别）
    pub failures: BTreeMap<String, u64>,

    /// 被上限截断的查询数
    pub truncated_queries: u64,

    /// 原始记录总数
    pub total_records: u64,

    /// 被丢弃的记录总数
    pub total_dropped: u64,

    /// 查询耗时统计 (ms)
    pub duration_stats: RunningStats,

    /// 每次查询的行数统计
    pub rows_stats: RunningStats,

    /// 每次查询的设备数统计
    pub device_stats: RunningStats,
}

impl QueryStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, stats: &QueryStats) {
        self.total_queries += 1;
        self.total_records += stats.records_fetched as u64;
        self.total_dropped += stats.rows_dropped as u64;
        if stats.truncated {
            self.truncated_queries += 1;
        }

        self.duration_stats.push(stats.duration_ms);
        self.rows_stats.push(stats.rows_joined as f64);
        self.device_stats.push(stats.devices as f64);
    }

    /// 记录失败
    pub fn record_failure(&mut self, class: ErrorClass) {
        *self.failures.entry(class.as_str().to_string()).or_insert(0) += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let failed: u64 = self.failures.values().sum();
        let attempts = self.total_queries + failed;
        MetricsSummary {
            total_queries: self.total_queries,
            failed_queries: failed,
            truncated_queries: self.truncated_queries,
            total_records: self.total_records,
            total_dropped: self.total_dropped,
            failure_rate: percent(failed, attempts),
            drop_rate: percent(self.total_dropped, self.total_records),
            duration_ms: StatsSummary::from(&self.duration_stats),
            rows: StatsSummary::from(&self.rows_stats),
            devices: StatsSummary::from(&self.device_stats),
            failures: self.failures.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_queries: u64,
    pub failed_queries: u64,
    pub truncated_queries: u64,
    pub total_records: u64,
    pub total_dropped: u64,
    pub failure_rate: f64,
    pub drop_rate: f64,
    pub duration_ms: StatsSummary,
    pub rows: StatsSummary,
    pub devices: StatsSummary,
    pub failures: BTreeMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Query Metrics Summary ===")?;
        writeln!(f, "Queries: {}", self.total_queries)?;
        writeln!(
            f,
            "Failed queries: {} ({:.2}%)",
            self.failed_queries, self.failure_rate
        )?;
        writeln!(f, "Truncated queries: {}", self.truncated_queries)?;
        writeln!(
            f,
            "Dropped records: {} of {} ({:.2}%)",
            self.total_dropped, self.total_records, self.drop_rate
        )?;
        writeln!(f, "Duration (ms): {}", self.duration_ms)?;
        writeln!(f, "Rows per query: {}", self.rows)?;
        writeln!(f, "Devices per query: {}", self.devices)?;

        if !self.failures.is_empty() {
            writeln!(f, "Failures by class:")?;
            for (class, count) in &self.failures {
                writeln!(f, "  {}: {}", class, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
