//! `groups` command implementation.

use anyhow::{Context, Result};

use crate::cli::GroupsArgs;
use crate::pipeline::{load_config, Session};

/// Execute the `groups` command
pub async fn run_groups(args: &GroupsArgs) -> Result<()> {
    let session = Session::new(load_config(&args.source)?)?;
    let groups = session.groups().await?;

    if args.json {
        let json = serde_json::to_string_pretty(&groups).context("Failed to serialize groups")?;
        println!("{}", json);
        return Ok(());
    }

    println!("Groups ({})", groups.len());
    for (i, group) in groups.iter().enumerate() {
        let prefix = if i == groups.len() - 1 { "└─" } else { "├─" };
        println!("   {} {:<16} {}", prefix, group.id, group.name);
    }
    Ok(())
}
