//! `serve` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ServeArgs;
use crate::pipeline::{load_config, Session};

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    let mut config = load_config(&args.source)?;

    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding listen host from CLI");
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding listen port from CLI");
        config.server.port = port;
    }

    let host = config.server.host.clone();
    let port = config.server.port;
    let state = Session::new(config)?.into_app_state();

    println!("fleetview API on http://{host}:{port}");
    tokio::select! {
        served = api_server::run_server(state, &host, port) => {
            served.with_context(|| format!("Server on {host}:{port} failed"))?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }
    Ok(())
}
