mod commands;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cloudtm")]
#[command(
    about = "CloudTimeMachine: Terraform state snapshots and safe infrastructure rollbacks",
    long_about = None
)]
struct Cli {
    /// 実行する terraform (既定: 設定ファイルの terraform_bin、なければ PATH 上の terraform)
    #[arg(long, global = true, env = cloudtm_config::TERRAFORM_ENV, value_name = "PROGRAM")]
    terraform: Option<String>,

    /// デバッグログを表示
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// カレントの Terraform プロジェクトで cloudtm を初期化
    Init {
        /// `terraform init` にそのまま渡す引数（-- 以降）
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// 変更を apply し、結果をスナップショットとして保存
    Apply {
        /// 対話的な承認をスキップ
        #[arg(long = "auto-approve")]
        auto_approve: bool,
        /// `terraform apply` にそのまま渡す引数（-- 以降）
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// インフラを破棄（terraform destroy のラッパー）
    Destroy {
        /// 対話的な承認をスキップ
        #[arg(long = "auto-approve")]
        auto_approve: bool,
    },
    /// スナップショットの一覧を表示
    List,
    /// スナップショットへロールバック、または実行中のロールバックを削除
    Rollback {
        /// ロールバック先のバージョン (例: v1, v2)
        #[arg(long, value_name = "VERSION", conflicts_with = "delete")]
        to: Option<String>,
        /// 実行中のロールバックを削除
        #[arg(long = "del", visible_alias = "delete")]
        delete: bool,
    },
    /// バージョン情報を表示
    Version,
}

fn init_tracing(verbose: bool) {
    // stdout は terraform の出力に使うので、ログは stderr へ
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let load = || utils::Context::load(cli.terraform.clone());

    match cli.command {
        Commands::Init { args } => commands::init::handle(&load()?, &args).await,
        Commands::Apply { auto_approve, args } => {
            commands::apply::handle(&load()?, auto_approve, &args).await
        }
        Commands::Destroy { auto_approve } => {
            commands::destroy::handle(&load()?, auto_approve).await
        }
        Commands::List => commands::list::handle(&load()?),
        Commands::Rollback { to, delete } => {
            commands::rollback::handle(&load()?, to.as_deref(), delete).await
        }
        // version は terraform もストアも不要
        Commands::Version => {
            println!("cloudtm {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!();
        eprintln!("{} {}", "❌ Error:".red().bold(), e);
        std::process::exit(1);
    }
}
