//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{DashboardConfig, SourceKind};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    source: SourceInfo,
    query: QueryInfo,
    export_layout: String,
    file_prefix: String,
    server: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct SourceInfo {
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    page_size: usize,
    max_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    mock_vehicles: Option<usize>,
}

#[derive(Serialize)]
struct QueryInfo {
    metric: String,
    scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_id: Option<String>,
    granularity: String,
    table: String,
    from: String,
    to: String,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    params: std::collections::HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config, args);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info, config.sinks.len());
    }

    Ok(())
}

fn build_config_info(config: &DashboardConfig, args: &InfoArgs) -> ConfigInfo {
    let source = &config.source;
    let params = config.query.to_params(chrono::Utc::now().date_naive());

    let sinks = if args.sinks {
        config
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                params: s.params.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", config.version),
        source: SourceInfo {
            kind: format!("{:?}", source.kind),
            path: source.path.as_ref().map(|p| p.display().to_string()),
            page_size: source.page_size,
            max_records: source.max_records,
            mock_vehicles: (source.kind == SourceKind::Mock).then_some(source.mock.vehicles),
        },
        query: QueryInfo {
            metric: params.metric.to_string(),
            scope: params.scope.to_string(),
            group_id: params.group_id().map(String::from),
            granularity: params.granularity.to_string(),
            table: params.granularity.table_name().to_string(),
            from: params.from.to_string(),
            to: params.to.to_string(),
        },
        export_layout: config.export.layout.as_str().to_string(),
        file_prefix: config.export.file_prefix.clone(),
        server: format!("{}:{}", config.server.host, config.server.port),
        sinks,
    }
}

fn print_config_info(info: &ConfigInfo, sink_count: usize) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 fleetview Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📦 Source");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Kind: {}", info.source.kind);
    if let Some(ref path) = info.source.path {
        println!("   ├─ Dataset: {}", path);
    }
    if let Some(vehicles) = info.source.mock_vehicles {
        println!("   ├─ Mock vehicles: {}", vehicles);
    }
    println!("   ├─ Page size: {}", info.source.page_size);
    println!("   └─ Record cap: {}", info.source.max_records);

    let query = &info.query;
    println!("\n🔎 Default Query");
    println!("   ├─ Metric: {}", query.metric);
    match query.group_id {
        Some(ref group) => println!("   ├─ Scope: {} ({})", query.scope, group),
        None => println!("   ├─ Scope: {}", query.scope),
    }
    println!("   ├─ Granularity: {} ({})", query.granularity, query.table);
    println!("   └─ Window: {} .. {}", query.from, query.to);

    println!("\n📄 Export");
    println!("   ├─ Layout: {}", info.export_layout);
    println!("   ├─ File prefix: {}", info.file_prefix);
    println!("   └─ Server: {}", info.server);

    if !info.sinks.is_empty() {
        println!("\n📤 Sinks ({})", info.sinks.len());
        for (i, sink) in info.sinks.iter().enumerate() {
            let prefix = if i == info.sinks.len() - 1 { "└─" } else { "├─" };
            println!("   {} {} ({})", prefix, sink.name, sink.sink_type);
        }
    } else if sink_count > 0 {
        println!("\n📤 Sinks: {} (use --sinks for details)", sink_count);
    }

    println!();
}
