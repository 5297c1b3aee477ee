use cloudtm_config::Settings;
use cloudtm_core::{ExcludeRules, Store};
use cloudtm_terraform::Terraform;
use colored::Colorize;
use std::path::Path;

/// コマンド共通の実行コンテキスト
pub struct Context {
    pub store: Store,
    pub settings: Settings,
    pub terraform: Terraform,
}

impl Context {
    /// カレントディレクトリをプロジェクトルートとして読み込む
    ///
    /// `--terraform` / `CLOUDTM_TERRAFORM` が設定ファイルの terraform_bin より優先される。
    pub fn load(terraform_override: Option<String>) -> anyhow::Result<Self> {
        let store = Store::from_current_dir()?;
        let settings = cloudtm_config::load_settings(store.project_root())?;

        let program = terraform_override
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| settings.terraform_bin.clone());
        tracing::debug!(program = %program, root = %store.project_root().display(), "Context loaded");

        Ok(Self {
            store,
            settings,
            terraform: Terraform::new(program),
        })
    }

    /// スナップショット時の除外ルール（組み込み + 設定ファイル）
    pub fn exclude_rules(&self) -> ExcludeRules {
        let mut rules = ExcludeRules::snapshot_defaults();
        rules.merge(&ExcludeRules {
            dirs: self.settings.exclude.dirs.clone(),
            files: self.settings.exclude.files.clone(),
            patterns: self.settings.exclude.patterns.clone(),
        });
        rules
    }

    /// terraform を解決し、絶対パスで起動する `Terraform` を返す
    ///
    /// `./bin/terraform` のような相対パスはプロジェクトルート基準。
    /// rollback ディレクトリで起動しても同じ実体を指す。
    pub fn require_terraform(&self) -> anyhow::Result<Terraform> {
        let program = Path::new(self.terraform.program());
        let candidate = if program.is_relative() && program.components().count() > 1 {
            Terraform::new(self.store.project_root().join(program).to_string_lossy())
        } else {
            self.terraform.clone()
        };

        let path = candidate.locate()?;
        tracing::debug!(path = %path.display(), "terraform located");
        Ok(Terraform::new(path.to_string_lossy()))
    }
}

/// 警告行を表示（処理は継続）
pub fn warn(message: impl std::fmt::Display) {
    eprintln!("{} {}", "⚠️ ".yellow(), message.to_string().yellow());
}

/// ヒント行を表示（エラー出力側）
pub fn hint(message: impl std::fmt::Display) {
    eprintln!("{} {}", "💡", message.to_string().cyan());
}
