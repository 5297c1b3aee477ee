use crate::utils::{self, Context};
use cloudtm_core::{ChangeSummary, parse_change_summary_bytes};
use cloudtm_terraform::{Approval, has_auto_approve};
use colored::Colorize;

pub async fn handle(ctx: &Context, auto_approve: bool, args: &[String]) -> anyhow::Result<()> {
    let terraform = ctx.require_terraform()?;
    ctx.store.require_initialized()?;

    // `cloudtm apply -auto-approve` のように terraform 形式で渡された場合も拾う
    let approval = Approval::from_flag(auto_approve || has_auto_approve(args));
    match approval {
        Approval::Auto => println!(
            "{}",
            "🚀 Running 'terraform apply -auto-approve'...".blue()
        ),
        Approval::Interactive => {
            println!("{}", "🚀 Running 'terraform apply' (interactive)...".blue())
        }
    }

    let output = terraform.apply(approval, args).await?;

    println!();
    println!("{}", "✅ Terraform apply completed successfully.".green().bold());

    match parse_change_summary_bytes(&output.stdout) {
        Some(summary) if summary.has_changes() => snapshot(ctx, summary),
        Some(summary) => {
            tracing::debug!(%summary, "No changes");
            println!(
                "{}",
                "ℹ️  No resource changes detected, skipping snapshot.".dimmed()
            );
            Ok(())
        }
        None => {
            utils::warn("Could not detect a resource change summary, skipping snapshot.");
            Ok(())
        }
    }
}

fn snapshot(ctx: &Context, summary: ChangeSummary) -> anyhow::Result<()> {
    println!();
    println!("{}", "📸 Creating snapshot...".blue());

    let created = ctx.store.create_snapshot(summary, &ctx.exclude_rules())?;
    let version = &created.meta.version;

    println!(
        "{} Copied {} files to versions/{}/",
        "✅".green(),
        created.copy.files,
        version
    );
    if !created.state_copied && ctx.store.state_path().exists() {
        utils::warn("Could not copy terraform.tfstate into the snapshot.");
    }
    println!(
        "{} Saved metadata: {} ({})",
        "✅".green(),
        format!("meta/{}.json", version).cyan(),
        created.meta.resources
    );
    println!();
    println!(
        "{} {}",
        "🎉 Snapshot created:".green().bold(),
        version.cyan().bold()
    );
    Ok(())
}
