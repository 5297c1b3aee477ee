#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const CHANGED: &str = "Apply complete! Resources: 1 added, 0 changed, 0 destroyed.";
#[allow(dead_code)]
pub const UNCHANGED: &str = "Apply complete! Resources: 0 added, 0 changed, 0 destroyed.";

/// 引数と作業ディレクトリを記録するだけの terraform
///
/// - `FAKE_TF_FAIL=<subcommand>` でそのサブコマンドを失敗させる
/// - `FAKE_TF_APPLY_OUTPUT` で apply の出力を差し替える
/// - `FAKE_TF_CONFIRM` を設定すると apply が承認の入力を待ち、`yes` 以外なら失敗する
const FAKE_TERRAFORM: &str = r#"#!/bin/sh
printf '%s|%s\n' "$*" "$(pwd)" >> "__LOG__"
if [ -n "$FAKE_TF_FAIL" ] && [ "$1" = "$FAKE_TF_FAIL" ]; then
  echo "Error: simulated $1 failure" >&2
  exit 1
fi
if [ "$1" = "apply" ] && [ -n "$FAKE_TF_CONFIRM" ]; then
  printf 'Enter a value: '
  read answer
  echo "got=$answer"
  [ "$answer" = "yes" ] || exit 1
fi
if [ "$1" = "apply" ]; then
  printf '%s\n' "${FAKE_TF_APPLY_OUTPUT:-__CHANGED__}"
fi
exit 0
"#;

pub struct TestProject {
    pub root: TempDir,
    /// terraform の偽物とログ置き場（プロジェクト外）
    pub tools: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        let project = Self { root, tools };
        project.install_fake_terraform();
        project.write_file("main.tf", "resource \"null_resource\" \"a\" {}\n");
        project
    }

    #[cfg(unix)]
    fn install_fake_terraform(&self) {
        use std::os::unix::fs::PermissionsExt;

        let script = FAKE_TERRAFORM
            .replace("__LOG__", &self.log_path().display().to_string())
            .replace("__CHANGED__", CHANGED);
        let path = self.terraform_path();
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(not(unix))]
    fn install_fake_terraform(&self) {}

    #[allow(dead_code)]
    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn terraform_path(&self) -> PathBuf {
        self.tools.path().join("terraform")
    }

    pub fn log_path(&self) -> PathBuf {
        self.tools.path().join("terraform.log")
    }

    /// 偽 terraform の呼び出し履歴（1行 = `args|pwd`）
    #[allow(dead_code)]
    pub fn terraform_calls(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// プロジェクト内で実行する cloudtm コマンド
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("cloudtm").unwrap();
        cmd.current_dir(self.root.path())
            .env("CLOUDTM_TERRAFORM", self.terraform_path())
            .env("XDG_CONFIG_HOME", self.tools.path())
            .env("NO_COLOR", "1")
            .env_remove("CLOUDTM_CONFIG_PATH")
            .env_remove("FAKE_TF_FAIL")
            .env_remove("FAKE_TF_APPLY_OUTPUT")
            .env_remove("FAKE_TF_CONFIRM")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[allow(dead_code)]
    pub fn read_file(&self, relative: &str) -> String {
        fs::read_to_string(self.root.path().join(relative)).unwrap()
    }

    #[allow(dead_code)]
    pub fn exists(&self, relative: &str) -> bool {
        self.root.path().join(relative).exists()
    }

    #[allow(dead_code)]
    pub fn read_json(&self, relative: &str) -> serde_json::Value {
        serde_json::from_str(&self.read_file(relative)).unwrap()
    }

    /// `resource_count` 個のリソースを持つ terraform.tfstate を書く
    #[allow(dead_code)]
    pub fn write_state(&self, resource_count: usize) {
        let resources: Vec<_> = (0..resource_count)
            .map(|i| serde_json::json!({"type": "null_resource", "name": format!("r{}", i)}))
            .collect();
        let state = serde_json::json!({"version": 4, "resources": resources});
        self.write_file("terraform.tfstate", &state.to_string());
    }

    #[allow(dead_code)]
    pub fn set_rollback_pointer(&self, version: &str) {
        self.write_file(
            ".cloudtm/rollback.json",
            &serde_json::json!({"rollback": version}).to_string(),
        );
    }

    /// `cloudtm init` を実行
    #[allow(dead_code)]
    pub fn init(&self) {
        self.cmd().arg("init").assert().success();
    }

    /// `apply_output` を出力する apply を実行
    #[allow(dead_code)]
    pub fn apply(&self, apply_output: &str) {
        self.cmd()
            .args(["apply", "--auto-approve"])
            .env("FAKE_TF_APPLY_OUTPUT", apply_output)
            .assert()
            .success();
    }
}
