//! LogSink - logs export summary via tracing

use chrono::Utc;
use contracts::{ContractError, CsvExport, ExportSink};
use tracing::{info, instrument};

/// Sink that logs export summaries for debugging
pub struct LogSink {
    name: String,
    delivered: usize,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delivered: 0,
        }
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

impl ExportSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_deliver",
        skip(self, export),
        fields(sink = %self.name, layout = export.layout.as_str())
    )]
    async fn deliver(&mut self, export: &CsvExport) -> Result<(), ContractError> {
        self.delivered += 1;
        info!(
            sink = %self.name,
            metric = %export.metric,
            granularity = %export.granularity,
            lines = export.line_count,
            bytes = export.content.len(),
            at = %Utc::now().to_rfc3339(),
            "export received"
        );
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, delivered = self.delivered, "LogSink closed");
        Ok(())
    }
}
