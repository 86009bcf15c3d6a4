//! Publisher - fans one export out to every configured sink
//!
//! A failing sink is logged and counted; it never stops delivery to the
//! others.

use contracts::{ContractError, CsvExport, ExportSink, SinkConfig, SinkType};
use metrics::counter;
use tracing::{error, info, instrument};

use crate::error::ExportError;
use crate::sink_metrics::{MetricsSnapshot, SinkMetrics};
use crate::sinks::{FileSink, LogSink};

/// Any sink the configuration can name
pub enum ConfiguredSink {
    Log(LogSink),
    File(FileSink),
}

impl ConfiguredSink {
    /// Create a sink from configuration
    #[instrument(
        name = "publisher_create_sink",
        skip(config),
        fields(sink = %config.name, sink_type = ?config.sink_type)
    )]
    pub fn from_config(config: &SinkConfig) -> Result<Self, ExportError> {
        match config.sink_type {
            SinkType::Log => Ok(Self::Log(LogSink::new(&config.name))),
            SinkType::File => FileSink::from_params(&config.name, &config.params)
                .map(Self::File)
                .map_err(|e| ExportError::sink_creation(&config.name, e.to_string())),
        }
    }
}

impl ExportSink for ConfiguredSink {
    fn name(&self) -> &str {
        match self {
            Self::Log(sink) => sink.name(),
            Self::File(sink) => sink.name(),
        }
    }

    async fn deliver(&mut self, export: &CsvExport) -> Result<(), ContractError> {
        match self {
            Self::Log(sink) => sink.deliver(export).await,
            Self::File(sink) => sink.deliver(export).await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(sink) => sink.close().await,
            Self::File(sink) => sink.close().await,
        }
    }
}

struct Slot<S> {
    sink: S,
    metrics: SinkMetrics,
}

/// Outcome of one publish
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl PublishReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delivers exports to a fixed set of sinks
pub struct Publisher<S = ConfiguredSink> {
    slots: Vec<Slot<S>>,
}

impl Publisher<ConfiguredSink> {
    /// Build a publisher from sink configs
    #[instrument(name = "publisher_from_configs", skip(configs), fields(sink_count = configs.len()))]
    pub fn from_configs(configs: &[SinkConfig]) -> Result<Self, ExportError> {
        let sinks = configs
            .iter()
            .map(ConfiguredSink::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_sinks(sinks))
    }
}

impl<S: ExportSink> Publisher<S> {
    /// Create a publisher with custom sinks (for testing)
    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self {
            slots: sinks
                .into_iter()
                .map(|sink| Slot {
                    sink,
                    metrics: SinkMetrics::new(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.slots
            .iter()
            .map(|slot| (slot.sink.name().to_string(), slot.metrics.snapshot()))
            .collect()
    }

    /// Deliver one export to every sink
    #[instrument(
        name = "publisher_publish",
        skip(self, export),
        fields(sinks = self.slots.len(), layout = export.layout.as_str())
    )]
    pub async fn publish(&mut self, export: &CsvExport) -> PublishReport {
        let mut report = PublishReport::default();
        for slot in &mut self.slots {
            let name = slot.sink.name().to_string();
            match slot.sink.deliver(export).await {
                Ok(()) => {
                    slot.metrics.record_delivery(export.content.len());
                    counter!("fleetview_sink_deliveries_total", "sink" => name.clone(), "status" => "ok")
                        .increment(1);
                    report.delivered.push(name);
                }
                Err(e) => {
                    slot.metrics.record_failure();
                    counter!("fleetview_sink_deliveries_total", "sink" => name.clone(), "status" => "error")
                        .increment(1);
                    error!(sink = %name, error = %e, "Delivery failed");
                    report.failed.push((name, e.to_string()));
                }
            }
        }
        info!(
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "export published"
        );
        report
    }

    /// Close every sink
    #[instrument(name = "publisher_shutdown", skip(self))]
    pub async fn shutdown(mut self) {
        for slot in &mut self.slots {
            if let Err(e) = slot.sink.close().await {
                error!(sink = %slot.sink.name(), error = %e, "Close failed on shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ExportLayout, Granularity, Metric};
    use std::collections::HashMap;
    use tempfile::tempdir;

    struct FailingSink;

    impl ExportSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        async fn deliver(&mut self, _export: &CsvExport) -> Result<(), ContractError> {
            Err(ContractError::sink_write("failing", "disk full"))
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn export() -> CsvExport {
        CsvExport {
            layout: ExportLayout::Pivot,
            metric: Metric::Distance,
            granularity: Granularity::Daily,
            line_count: 1,
            content: "device_name,device_serial,2024-01-01\nA,S1,1.00\n".into(),
        }
    }

    #[tokio::test]
    async fn test_publish_from_configs() {
        let dir = tempdir().unwrap();
        let configs = vec![
            SinkConfig {
                name: "console".into(),
                sink_type: SinkType::Log,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "disk".into(),
                sink_type: SinkType::File,
                params: HashMap::from([(
                    "base_path".to_string(),
                    dir.path().display().to_string(),
                )]),
            },
        ];

        let mut publisher = Publisher::from_configs(&configs).unwrap();
        assert_eq!(publisher.len(), 2);

        let report = publisher.publish(&export()).await;
        assert!(report.all_delivered());
        assert_eq!(report.delivered, vec!["console", "disk"]);
        assert!(dir.path().join("fleetview-distance-daily-pivot.csv").exists());

        let metrics = publisher.metrics();
        assert_eq!(metrics[1].1.delivered, 1);
        publisher.shutdown().await;
    }

    #[tokio::test]
    async fn test_failing_sink_isolated() {
        let mut publisher = Publisher::with_sinks(vec![FailingSink, FailingSink]);
        let report = publisher.publish(&export()).await;
        assert!(!report.all_delivered());
        assert_eq!(report.failed.len(), 2);
        assert_eq!(publisher.metrics()[0].1.failed, 1);
    }
}
