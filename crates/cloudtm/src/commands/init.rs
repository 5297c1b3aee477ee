use crate::utils::Context;
use colored::Colorize;

pub async fn handle(ctx: &Context, args: &[String]) -> anyhow::Result<()> {
    let terraform = ctx.require_terraform()?;

    let report = ctx.store.initialize()?;
    if report.created_store {
        println!(
            "{}",
            "✅ Created .cloudtm/ directory with versions/ and meta/ folders.".green()
        );
    } else {
        println!("ℹ️  .cloudtm/ directory already exists. Verified subfolders.");
    }
    if report.created_current {
        println!(
            "{}",
            "✅ Created 'current.json' file to track snapshot versions.".green()
        );
    }
    if report.created_rollback {
        println!(
            "{}",
            "✅ Created 'rollback.json' file to track rollback status.".green()
        );
    }

    println!();
    println!("{}", "🚀 Running 'terraform init'...".blue());
    terraform.init(args).await?;

    println!();
    println!("{}", "✅ Terraform initialized successfully.".green().bold());
    println!("CloudTimeMachine is now ready to manage state snapshots.");
    Ok(())
}
