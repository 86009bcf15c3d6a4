//! FileSink - writes CSV exports into a directory

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use contracts::{ContractError, CsvExport, ExportLayout, ExportSink};
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output directory
    pub base_path: PathBuf,
    /// File name prefix
    pub prefix: String,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("./output"),
            prefix: "fleetview".to_string(),
        }
    }
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or(defaults.base_path);
        let prefix = params.get("prefix").cloned().unwrap_or(defaults.prefix);

        Self { base_path, prefix }
    }

    /// `<prefix>-<metric>-<granularity>.csv`, with `-pivot` before the
    /// extension for pivot exports
    pub fn file_name(&self, export: &CsvExport) -> String {
        let suffix = match export.layout {
            ExportLayout::Flat => "",
            ExportLayout::Pivot => "-pivot",
        };
        format!(
            "{}-{}-{}{suffix}.csv",
            self.prefix, export.metric, export.granularity
        )
    }
}

/// Sink that writes exports to disk files
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    written: Vec<PathBuf>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
            written: Vec::new(),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    /// Files written so far, in delivery order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn persist(&mut self, export: &CsvExport) -> Result<PathBuf, ContractError> {
        let path = self.config.base_path.join(self.config.file_name(export));
        fs::write(&path, export.content.as_bytes()).map_err(|e| {
            error!(sink = %self.name, path = %path.display(), error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })?;
        Ok(path)
    }
}

impl ExportSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_deliver",
        skip(self, export),
        fields(sink = %self.name, layout = export.layout.as_str())
    )]
    async fn deliver(&mut self, export: &CsvExport) -> Result<(), ContractError> {
        let path = self.persist(export)?;
        debug!(path = %path.display(), lines = export.line_count, "export written");
        self.written.push(path);
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, files = self.written.len(), "FileSink closed");
        Ok(())
    }
}
