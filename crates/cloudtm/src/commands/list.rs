use crate::utils::{self, Context};
use cloudtm_core::{CurrentPointer, SnapshotMeta};
use colored::Colorize;

const RULE_WIDTH: usize = 78;

pub fn handle(ctx: &Context) -> anyhow::Result<()> {
    ctx.store.require_initialized()?;

    let current = ctx.store.read_current().unwrap_or_else(|e| {
        utils::warn(format!("Could not read current.json: {}", e));
        CurrentPointer::default()
    });

    let snapshots = ctx.store.list_snapshots()?;
    if snapshots.is_empty() {
        println!("ℹ️  No versions found. Run 'cloudtm apply' to create your first snapshot.");
        return Ok(());
    }

    println!();
    println!("{}", "📦 CloudTimeMachine Versions".bold());
    println!("{}", "─".repeat(RULE_WIDTH).dimmed());
    match current.version() {
        Some(version) => {
            let status = if current.status {
                "Active".green()
            } else {
                "Inactive".yellow()
            };
            println!("Current: {} ({})", version.cyan(), status);
        }
        None => println!("Current: {}", "None".dimmed()),
    }
    println!();

    println!(
        "{}",
        format!(
            "{:<10} {:<22} {:<7} {:<9} {:<11} {}",
            "Version", "Timestamp", "Added", "Changed", "Destroyed", "Status"
        )
        .bold()
    );
    for row in rows(&snapshots, &current) {
        println!("{}", row);
    }

    println!("{}", "─".repeat(RULE_WIDTH).dimmed());
    println!("Use: cloudtm rollback --to <version>");
    println!();
    Ok(())
}

/// 表の各行（カレントには `*`、稼働中なら Active）
fn rows(snapshots: &[SnapshotMeta], current: &CurrentPointer) -> Vec<String> {
    snapshots
        .iter()
        .map(|meta| {
            let is_current = current.version() == Some(meta.version.as_str());
            let version = if is_current {
                format!("{} *", meta.version)
            } else {
                meta.version.clone()
            };
            let status = if is_current && current.status {
                "Active"
            } else {
                "-"
            };
            format!(
                "{:<10} {:<22} {:<7} {:<9} {:<11} {}",
                version,
                meta.timestamp,
                meta.resources.added,
                meta.resources.changed,
                meta.resources.destroyed,
                status
            )
        })
        .collect()
}
