//! # Exporter
//!
//! CSV 导出模块。
//!
//! 负责：
//! - 将扁平行列表或透视矩阵序列化为 CSV
//! - 将导出结果分发到配置的 sinks（文件、日志）
//! - 单个 sink 失败不影响其他 sinks

pub mod error;
pub mod publisher;
pub mod render;
pub mod sink_metrics;
pub mod sinks;

pub use contracts::{CsvExport, ExportLayout, ExportSink};
pub use error::{ExportError, Result};
pub use publisher::{ConfiguredSink, PublishReport, Publisher};
pub use render::{export_csv, render, ExportSource, FLAT_HEADER};
pub use sink_metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, FileSinkConfig, LogSink};
