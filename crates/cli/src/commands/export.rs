//! `export` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use contracts::{CsvExport, DashboardConfig, ExportLayout, SinkConfig, SinkType};
use exporter::{ExportSource, Publisher};
use tracing::info;

use crate::cli::ExportArgs;
use crate::error::CliError;
use crate::pipeline::{apply_query_overrides, load_config, Session};

/// Execute the `export` command
pub async fn run_export(args: &ExportArgs) -> Result<()> {
    let mut config = load_config(&args.source)?;
    apply_query_overrides(&mut config, &args.query);
    let layout = args.format.unwrap_or(config.export.layout);

    let session = Session::new(config)?;
    let params = session.params();
    let result = session.run(&params).await?;

    let matrix;
    let source = match layout {
        ExportLayout::Flat => ExportSource::Rows(&result.rows),
        ExportLayout::Pivot => {
            matrix = result.pivot();
            ExportSource::Pivot(&matrix)
        }
    };
    let export =
        exporter::render(source, params.metric, params.granularity).map_err(CliError::from)?;
    info!(
        layout = layout.as_str(),
        lines = export.line_count,
        bytes = export.content.len(),
        "Export rendered"
    );

    match args.output.as_deref() {
        Some(path) if path == Path::new("-") => print!("{}", export.content),
        Some(path) => {
            std::fs::write(path, &export.content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Wrote {} lines to {}", export.line_count, path.display());
        }
        None if session.config().sinks.is_empty() => print!("{}", export.content),
        None => publish(session.config(), &export).await?,
    }

    Ok(())
}

/// Deliver to every configured sink; any failed sink fails the command
async fn publish(config: &DashboardConfig, export: &CsvExport) -> Result<()> {
    let sinks = sink_configs(config);
    let mut publisher = Publisher::from_configs(&sinks).map_err(CliError::from)?;
    let report = publisher.publish(export).await;
    publisher.shutdown().await;

    for name in &report.delivered {
        println!("✓ Delivered to sink '{}'", name);
    }
    if !report.all_delivered() {
        for (name, error) in &report.failed {
            println!("✗ Sink '{}' failed: {}", name, error);
        }
        let sinks = report.failed.into_iter().map(|(name, _)| name).collect();
        return Err(CliError::Delivery { sinks }.into());
    }
    Ok(())
}

/// Sink configs with the export file prefix applied to file sinks that set none
fn sink_configs(config: &DashboardConfig) -> Vec<SinkConfig> {
    config
        .sinks
        .iter()
        .cloned()
        .map(|mut sink| {
            if sink.sink_type == SinkType::File {
                sink.params
                    .entry("prefix".to_string())
                    .or_insert_with(|| config.export.file_prefix.clone());
            }
            sink
        })
        .collect()
}
