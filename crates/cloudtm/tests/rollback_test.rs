//! rollback の前提条件・作成・削除を偽 terraform で確認する
#![cfg(unix)]

mod common;

use common::{CHANGED, TestProject};
use predicates::prelude::*;

/// v1 を作成し、リソースを破棄した状態にする
fn project_with_destroyed_v1() -> TestProject {
    let project = TestProject::new();
    project.init();
    project.write_state(1);
    project.apply(CHANGED);
    project.write_state(0);
    project
}

#[test]
fn test_rollback_to_version() {
    let project = project_with_destroyed_v1();
    project.write_file("main.tf", "resource \"null_resource\" \"b\" {}\n");

    project
        .cmd()
        .args(["rollback", "--to", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rollback completed successfully"))
        .stdout(predicate::str::contains("rolled back to version: v1"));

    assert_eq!(
        project.read_file(".cloudtm/rollback/main.tf"),
        "resource \"null_resource\" \"a\" {}\n"
    );
    assert!(project.exists(".cloudtm/rollback/v1.json"));
    assert_eq!(
        project.read_json(".cloudtm/rollback.json"),
        serde_json::json!({"rollback": "v1"})
    );

    let calls = project.terraform_calls();
    let rollback_calls: Vec<_> = calls
        .iter()
        .filter(|c| c.ends_with(".cloudtm/rollback"))
        .collect();
    assert_eq!(rollback_calls.len(), 2);
    assert!(rollback_calls[0].starts_with("init|"));
    assert!(rollback_calls[1].starts_with("apply --auto-approve|"));
}

/// state にリソースが残っていれば、rollback 中でもそのメッセージが優先される
#[test]
fn test_rollback_refused_while_resources_exist() {
    let project = project_with_destroyed_v1();
    project.write_state(2);
    project.set_rollback_pointer("v1");

    project
        .cmd()
        .args(["rollback", "--to", "v1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Resources still exist"))
        .stderr(predicate::str::contains("cloudtm destroy"));

    assert!(!project.exists(".cloudtm/rollback"));
}

/// 既存の rollback を壊さずに中断する
#[test]
fn test_rollback_refused_while_rollback_active() {
    let project = project_with_destroyed_v1();
    project.apply(CHANGED);
    project.write_state(0);
    project.set_rollback_pointer("v1");
    project.write_file(".cloudtm/rollback/main.tf", "v1 working copy");
    let calls_before = project.terraform_calls().len();

    project
        .cmd()
        .args(["rollback", "--to", "v2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Rollback to version 'v1' is already applied",
        ));

    assert_eq!(
        project.read_file(".cloudtm/rollback/main.tf"),
        "v1 working copy"
    );
    assert_eq!(project.read_json(".cloudtm/rollback.json")["rollback"], "v1");
    assert_eq!(project.terraform_calls().len(), calls_before);
}

#[test]
fn test_rollback_unknown_version() {
    let project = project_with_destroyed_v1();

    for version in ["v7", "latest", "../versions"] {
        project
            .cmd()
            .args(["rollback", "--to", version])
            .assert()
            .failure()
            .stderr(predicate::str::contains(format!(
                "Version '{}' does not exist",
                version
            )));
    }

    assert!(!project.exists(".cloudtm/rollback"));
}

#[test]
fn test_rollback_requires_state_file() {
    let project = TestProject::new();
    project.init();
    project.apply(CHANGED);

    project
        .cmd()
        .args(["rollback", "--to", "v1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("State file not found"));
}

/// apply が失敗したら作業ディレクトリを残し、ポインタは更新しない
#[test]
fn test_rollback_apply_failure_keeps_directory() {
    let project = project_with_destroyed_v1();

    project
        .cmd()
        .args(["rollback", "--to", "v1"])
        .env("FAKE_TF_FAIL", "apply")
        .assert()
        .failure()
        .stderr(predicate::str::contains("preserved for investigation"));

    assert!(project.exists(".cloudtm/rollback/main.tf"));
    assert_eq!(project.read_json(".cloudtm/rollback.json")["rollback"], "");
}

#[test]
fn test_delete_without_active_rollback() {
    let project = project_with_destroyed_v1();

    project
        .cmd()
        .args(["rollback", "--del"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to delete"));
}

#[test]
fn test_delete_active_rollback() {
    let project = project_with_destroyed_v1();
    project.cmd().args(["rollback", "--to", "v1"]).assert().success();

    project
        .cmd()
        .args(["rollback", "--delete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rollback cleanup completed"));

    assert!(!project.exists(".cloudtm/rollback"));
    assert_eq!(project.read_json(".cloudtm/rollback.json")["rollback"], "");

    let calls = project.terraform_calls();
    let last = calls.last().unwrap();
    assert!(last.starts_with("destroy --auto-approve|"));
    assert!(last.ends_with(".cloudtm/rollback"));
}

/// `./bin/terraform` のような相対指定でも rollback ディレクトリから同じ terraform を起動する
#[test]
fn test_rollback_with_relative_terraform_path() {
    use std::os::unix::fs::PermissionsExt;

    let project = TestProject::new();
    let local_bin = project.path().join("bin/terraform");
    std::fs::create_dir_all(local_bin.parent().unwrap()).unwrap();
    std::fs::copy(project.terraform_path(), &local_bin).unwrap();
    std::fs::set_permissions(&local_bin, std::fs::Permissions::from_mode(0o755)).unwrap();

    let relative = |args: &[&str]| {
        let mut cmd = project.cmd();
        cmd.args(args).env("CLOUDTM_TERRAFORM", "./bin/terraform");
        cmd
    };

    relative(&["init"]).assert().success();
    project.write_file(".cloudtm/config.json", r#"{"exclude": {"dirs": ["bin"]}}"#);
    project.write_state(1);
    relative(&["apply", "--auto-approve"]).assert().success();
    project.write_state(0);

    relative(&["rollback", "--to", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rollback completed successfully"));

    assert!(!project.exists(".cloudtm/versions/v1/tf_configs/bin"));
    assert_eq!(project.read_json(".cloudtm/rollback.json")["rollback"], "v1");
    let rollback_calls: Vec<_> = project
        .terraform_calls()
        .into_iter()
        .filter(|c| c.ends_with(".cloudtm/rollback"))
        .collect();
    assert_eq!(rollback_calls.len(), 2);
    assert!(rollback_calls[0].starts_with("init|"));
    assert!(rollback_calls[1].starts_with("apply --auto-approve|"));

    relative(&["rollback", "--del"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rollback cleanup completed"));
    assert!(!project.exists(".cloudtm/rollback"));
}

/// 作業ディレクトリが無ければ terraform を呼ばずにポインタだけ戻す
#[test]
fn test_delete_with_missing_directory() {
    let project = project_with_destroyed_v1();
    project.set_rollback_pointer("v1");
    let calls_before = project.terraform_calls().len();

    project
        .cmd()
        .args(["rollback", "--del"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Rollback directory not found"));

    assert_eq!(project.read_json(".cloudtm/rollback.json")["rollback"], "");
    assert_eq!(project.terraform_calls().len(), calls_before);
}

#[test]
fn test_delete_destroy_failure_keeps_pointer() {
    let project = project_with_destroyed_v1();
    project.cmd().args(["rollback", "--to", "v1"]).assert().success();

    project
        .cmd()
        .args(["rollback", "--del"])
        .env("FAKE_TF_FAIL", "destroy")
        .assert()
        .failure();

    assert!(project.exists(".cloudtm/rollback"));
    assert_eq!(project.read_json(".cloudtm/rollback.json")["rollback"], "v1");
}

#[test]
fn test_status_without_rollback() {
    let project = project_with_destroyed_v1();

    project
        .cmd()
        .arg("rollback")
        .assert()
        .success()
        .stdout(predicate::str::contains("No active rollback"))
        .stdout(predicate::str::contains("cloudtm rollback --to vN"));
}

#[test]
fn test_status_shows_active_rollback() {
    let project = project_with_destroyed_v1();
    project.cmd().args(["rollback", "--to", "v1"]).assert().success();

    project
        .cmd()
        .arg("rollback")
        .assert()
        .success()
        .stdout(predicate::str::contains("Active Rollback: v1"))
        .stdout(predicate::str::contains("Added:      1"))
        .stdout(predicate::str::contains("Destroyed:  0"));
}
