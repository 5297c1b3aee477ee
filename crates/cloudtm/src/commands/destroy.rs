use crate::utils::{self, Context};
use cloudtm_terraform::Approval;
use colored::Colorize;

pub async fn handle(ctx: &Context, auto_approve: bool) -> anyhow::Result<()> {
    let terraform = ctx.require_terraform()?;
    ctx.store.require_initialized()?;

    let approval = Approval::from_flag(auto_approve);
    match approval {
        Approval::Auto => println!(
            "{}",
            "🚀 Running 'terraform destroy --auto-approve'...".blue()
        ),
        Approval::Interactive => {
            println!("{}", "🚀 Running 'terraform destroy' (interactive)...".blue())
        }
    }

    terraform.destroy(approval).await?;

    println!();
    println!("{}", "✅ Terraform destroy completed successfully.".green().bold());

    // スナップショットはそのまま、稼働フラグだけ落とす
    if let Err(e) = ctx.store.set_current_status(false) {
        utils::warn(format!("Failed to update current status: {}", e));
    }
    Ok(())
}
