//! `query` command implementation.

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{PivotMatrix, SelectionSet, SeriesSet, TablePage, VehicleKey};
use tracing::{info, warn};

use crate::cli::{QueryArgs, View};
use crate::error::CliError;
use crate::pipeline::{apply_query_overrides, load_config, Session, SessionStats};

/// Execute the `query` command
pub async fn run_query(args: &QueryArgs) -> Result<()> {
    let mut config = load_config(&args.source)?;
    apply_query_overrides(&mut config, &args.query);
    let selected = parse_selection(&args.select)?;

    let session = Session::new(config)?;
    let params = session.params();
    info!(
        metric = %params.metric,
        scope = %params.scope_label(),
        granularity = %params.granularity,
        from = %params.from,
        to = %params.to,
        "Running query"
    );

    let mut stats = SessionStats::default();
    let started = Instant::now();
    let mut last = None;
    for run in 1..=args.repeat.max(1) {
        match session.run(&params).await {
            Ok(result) => {
                stats.record(&result.stats);
                last = Some(result);
            }
            Err(e) => {
                warn!(run, error = %e, "Query failed");
                if let Some(class) = e.class() {
                    stats.record_failure(class);
                }
                if args.repeat <= 1 {
                    return Err(e.into());
                }
            }
        }
    }
    stats.duration = started.elapsed();
    stats.ingestion = session.runner().metrics().snapshot();

    let Some(result) = last else {
        anyhow::bail!("All {} query runs failed", args.repeat);
    };

    if result.stats.truncated {
        warn!(
            records = result.stats.records_fetched,
            "Record cap reached, results are partial"
        );
    }

    match args.view {
        View::Series => {
            let series = result.series(args.mode, &selected);
            if args.json {
                print_json(&series)?;
            } else {
                print_series(&series);
            }
        }
        View::Table => {
            let page = result.table(args.page, args.page_size).map_err(CliError::from)?;
            if args.json {
                print_json(&page)?;
            } else {
                print_table(&page);
            }
        }
        View::Pivot => {
            let matrix = result.pivot();
            if args.json {
                print_json(&matrix)?;
            } else {
                print_pivot(&matrix);
            }
        }
    }

    if args.repeat > 1 {
        stats.print_summary();
    }

    Ok(())
}

fn parse_selection(selectors: &[String]) -> Result<SelectionSet> {
    selectors
        .iter()
        .map(|s| VehicleKey::parse_selector(s).map_err(|e| anyhow::Error::from(CliError::from(e))))
        .collect()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn print_series(series: &SeriesSet) {
    if series.full.is_empty() {
        println!("(no data)");
        return;
    }

    let has_selection = !series.selected.is_empty();
    if has_selection {
        println!("{:<12} {:>14} {:>14}", "bucket", "fleet", "selected");
    } else {
        println!("{:<12} {:>14}", "bucket", "fleet");
    }

    for point in &series.full {
        if has_selection {
            let selected = series
                .selected
                .iter()
                .find(|p| p.bucket == point.bucket)
                .map(|p| format!("{:.2}", p.value))
                .unwrap_or_default();
            println!("{:<12} {:>14.2} {:>14}", point.bucket, point.value, selected);
        } else {
            println!("{:<12} {:>14.2}", point.bucket, point.value);
        }
    }
}

fn print_table(page: &TablePage) {
    println!(
        "Page {}/{} ({} rows total)",
        page.page, page.total_pages, page.total_rows
    );
    println!(
        "{:<12} {:<24} {:<16} {:>12}",
        "bucket", "device_name", "device_serial", "value"
    );
    for row in &page.rows {
        println!(
            "{:<12} {:<24} {:<16} {:>12.2}",
            row.bucket, row.device_name, row.device_serial, row.value
        );
    }
}

fn print_pivot(matrix: &PivotMatrix) {
    if matrix.is_empty() {
        println!("(no data)");
        return;
    }

    print!("{:<24} {:<16}", "device_name", "device_serial");
    for bucket in &matrix.buckets {
        print!(" {:>12}", bucket);
    }
    println!(" {:>12}", "total");

    for vehicle in &matrix.vehicles {
        print!("{:<24} {:<16}", vehicle.device_name, vehicle.device_serial);
        for bucket in &matrix.buckets {
            match vehicle.values.get(bucket) {
                Some(value) => print!(" {:>12.2}", value),
                None => print!(" {:>12}", ""),
            }
        }
        println!(" {:>12.2}", vehicle.total());
    }
}
