use crate::utils::{self, Context};
use cloudtm_core::CoreError;
use cloudtm_terraform::Approval;
use colored::Colorize;

const RULE_WIDTH: usize = 62;

pub async fn handle(ctx: &Context, to: Option<&str>, delete: bool) -> anyhow::Result<()> {
    ctx.store.require_initialized()?;

    match (to, delete) {
        (Some(version), _) => rollback_to(ctx, version).await,
        (None, true) => delete_rollback(ctx).await,
        (None, false) => show_status(ctx),
    }
}

async fn rollback_to(ctx: &Context, version: &str) -> anyhow::Result<()> {
    println!("{}", "🔍 Checking rollback preconditions...".blue());
    if let Err(e) = ctx.store.check_rollback_preconditions(version) {
        report_precondition_failure(&e);
        std::process::exit(1);
    }
    println!("{}", "✅ Terraform state is empty".green());
    println!("{}", "✅ No active rollback in progress".green());
    println!("{} Found version '{}'", "✅".green(), version.cyan());

    let terraform = ctx.require_terraform()?;

    let materialized = ctx.store.materialize_rollback(version)?;
    println!(
        "{} Copied configs from '{}' to rollback directory ({} files)",
        "✅".green(),
        version,
        materialized.copy.files
    );
    if materialized.meta_copied {
        println!(
            "{} Copied metadata '{}.json' to rollback directory",
            "✅".green(),
            version
        );
    } else {
        utils::warn("Could not copy metadata file into rollback directory");
    }

    let terraform = terraform.in_dir(ctx.store.rollback_dir());

    println!();
    println!("{}", "🚀 Running 'terraform init' in rollback directory...".blue());
    if let Err(e) = terraform.init(&[]).await {
        utils::warn("Rollback directory preserved for investigation");
        return Err(e.into());
    }
    println!("{}", "✅ Terraform initialized successfully".green());

    println!();
    println!(
        "{}",
        "🚀 Running 'terraform apply --auto-approve' in rollback directory...".blue()
    );
    if let Err(e) = terraform.apply(Approval::Auto, &[]).await {
        utils::warn("Rollback directory preserved for investigation");
        return Err(e.into());
    }

    ctx.store.mark_rollback_active(version)?;
    println!();
    println!("{} Updated rollback.json to version: {}", "✅".green(), version);

    println!();
    println!("{}", "🎉 Rollback completed successfully!".green().bold());
    println!(
        "{} Infrastructure rolled back to version: {}",
        "✅".green(),
        version.cyan().bold()
    );
    println!("📁 Rollback configs available in: .cloudtm/rollback/");
    Ok(())
}

fn report_precondition_failure(error: &CoreError) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
    match error {
        CoreError::ResourcesStillExist(_) => {
            utils::warn("You must destroy all resources before rollback");
            utils::hint("Run: terraform destroy");
            utils::hint("Or: cloudtm destroy");
        }
        CoreError::RollbackActive(_) => {
            utils::warn("You must destroy the rollback first");
            utils::hint("Run: cloudtm rollback --del");
        }
        CoreError::StateNotFound(_) => {
            utils::hint("Run this command from the Terraform project directory");
        }
        CoreError::VersionNotFound(_) => {
            utils::hint("Run: cloudtm list");
        }
        _ => {}
    }
}

async fn delete_rollback(ctx: &Context) -> anyhow::Result<()> {
    println!("{}", "🔍 Checking rollback status...".blue());

    let pointer = ctx.store.read_rollback()?;
    let Some(version) = pointer.active() else {
        println!("ℹ️  Nothing to delete - no active rollback found");
        return Ok(());
    };
    println!("{} Found active rollback: {}", "✅".green(), version.cyan());

    let rollback_dir = ctx.store.rollback_dir();
    if !rollback_dir.is_dir() {
        utils::warn("Rollback directory not found, resetting rollback.json...");
        ctx.store.clear_rollback()?;
        println!("{}", "✅ Reset rollback.json".green());
        return Ok(());
    }

    let terraform = ctx.require_terraform()?;

    println!();
    println!(
        "{}",
        "🚀 Running 'terraform destroy --auto-approve' in rollback directory...".blue()
    );
    if let Err(e) = terraform.in_dir(&rollback_dir).destroy(Approval::Auto).await {
        utils::warn("Rollback directory preserved for investigation");
        return Err(e.into());
    }
    println!();
    println!("{}", "✅ Rollback resources destroyed successfully".green());

    ctx.store.clear_rollback()?;
    println!("{}", "✅ Deleted rollback directory".green());
    println!("{}", "✅ Reset rollback.json".green());

    println!();
    println!("{}", "🎉 Rollback cleanup completed!".green().bold());
    Ok(())
}

fn show_status(ctx: &Context) -> anyhow::Result<()> {
    println!();
    println!("{}", "🔄 Current Rollback Status".bold());
    println!("{}", "─".repeat(RULE_WIDTH).dimmed());

    let pointer = ctx.store.read_rollback()?;
    match pointer.active() {
        None => println!("ℹ️  No active rollback"),
        Some(version) => {
            println!("Active Rollback: {}", version.cyan().bold());
            println!();
            match ctx.store.read_meta(version) {
                Ok(meta) => {
                    println!("Version:    {}", meta.version);
                    println!("Timestamp:  {}", meta.timestamp);
                    println!("Added:      {}", meta.resources.added);
                    println!("Changed:    {}", meta.resources.changed);
                    println!("Destroyed:  {}", meta.resources.destroyed);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Could not read rollback metadata");
                    utils::warn(format!("Could not read metadata for {}", version));
                }
            }
            println!("{}", "─".repeat(RULE_WIDTH).dimmed());
        }
    }

    println!();
    println!("Usage:");
    println!("  cloudtm rollback --to vN        # Rollback to version");
    println!("  cloudtm rollback --del          # Delete active rollback");
    println!();
    Ok(())
}
