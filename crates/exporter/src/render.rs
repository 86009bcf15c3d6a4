//! CSV rendering of the flat row list and the pivot matrix

use contracts::{
    ContractError, CsvExport, ExportLayout, Granularity, Metric, NormalizedRow, PivotMatrix,
};
use metrics::counter;
use tracing::{debug, instrument};

use crate::error::Result;

/// Flat layout header
pub const FLAT_HEADER: [&str; 4] = ["bucket", "device_name", "device_serial", "value"];

/// What to serialize
#[derive(Debug, Clone, Copy)]
pub enum ExportSource<'a> {
    Rows(&'a [NormalizedRow]),
    Pivot(&'a PivotMatrix),
}

impl ExportSource<'_> {
    pub fn layout(&self) -> ExportLayout {
        match self {
            Self::Rows(_) => ExportLayout::Flat,
            Self::Pivot(_) => ExportLayout::Pivot,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Rows(rows) => rows.is_empty(),
            Self::Pivot(matrix) => matrix.vehicles.is_empty(),
        }
    }
}

fn format_value(value: f64) -> String {
    format!("{value:.2}")
}

/// Serialize rows or a pivot matrix to CSV text
///
/// Values carry exactly two decimals; missing pivot cells are empty fields.
/// Fields containing a comma, double quote or newline are quoted.
///
/// # Errors
/// `EmptyExport` if there are no rows (flat) or no vehicles (pivot)
pub fn export_csv(source: ExportSource<'_>) -> Result<String> {
    Ok(write_csv(source)?.0)
}

/// Render an export document with its description
#[instrument(
    name = "exporter_render",
    skip(source),
    fields(layout = source.layout().as_str(), metric = %metric, granularity = %granularity)
)]
pub fn render(
    source: ExportSource<'_>,
    metric: Metric,
    granularity: Granularity,
) -> Result<CsvExport> {
    let layout = source.layout();
    let outcome = write_csv(source);
    let status = if outcome.is_ok() { "ok" } else { "error" };
    counter!("fleetview_exports_total", "layout" => layout.as_str(), "status" => status)
        .increment(1);

    let (content, line_count) = outcome?;
    debug!(lines = line_count, bytes = content.len(), "export rendered");
    Ok(CsvExport {
        layout,
        metric,
        granularity,
        line_count,
        content,
    })
}

fn write_csv(source: ExportSource<'_>) -> Result<(String, usize)> {
    if source.is_empty() {
        let what = match source.layout() {
            ExportLayout::Flat => "rows",
            ExportLayout::Pivot => "pivot vehicles",
        };
        return Err(ContractError::empty_export(what).into());
    }

    let mut writer = ::csv::Writer::from_writer(Vec::new());
    let lines = match source {
        ExportSource::Rows(rows) => {
            writer.write_record(FLAT_HEADER)?;
            for row in rows {
                writer.write_record([
                    row.bucket.as_str(),
                    row.device_name.as_str(),
                    row.device_serial.as_str(),
                    format_value(row.value).as_str(),
                ])?;
            }
            rows.len()
        }
        ExportSource::Pivot(matrix) => {
            let header = ["device_name", "device_serial"]
                .into_iter()
                .chain(matrix.buckets.iter().map(String::as_str));
            writer.write_record(header)?;
            for vehicle in &matrix.vehicles {
                let mut record = Vec::with_capacity(matrix.buckets.len() + 2);
                record.push(vehicle.device_name.clone());
                record.push(vehicle.device_serial.clone());
                record.extend(
                    matrix
                        .buckets
                        .iter()
                        .map(|b| vehicle.values.get(b).map(|v| format_value(*v)).unwrap_or_default()),
                );
                writer.write_record(&record)?;
            }
            matrix.vehicles.len()
        }
    };

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok((String::from_utf8(bytes)?, lines))
}
