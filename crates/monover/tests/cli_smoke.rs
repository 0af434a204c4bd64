use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn go_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path();
    fs::write(path.join("go.mod"), "module example.com/repo\n\ngo 1.22\n").unwrap();
    fs::create_dir_all(path.join("libA")).unwrap();
    fs::write(path.join("libA/go.mod"), "module example.com/repo/libA\n").unwrap();
    fs::create_dir_all(path.join("libB")).unwrap();
    fs::write(
        path.join("libB/go.mod"),
        "module example.com/repo/libB\n\nrequire example.com/repo/libA v0.1.0\n",
    )
    .unwrap();
    temp_dir
}

fn monover(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("monover").unwrap();
    cmd.arg("-C").arg(dir.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_init_add_status() {
    let repo = go_repo();

    monover(&repo)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("for example.com/repo"));
    assert!(repo.path().join(".changeset/config.json").exists());

    monover(&repo)
        .args(["add", "-m", "libA:minor", "-s", "Add streaming reader"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created changeset"))
        .stdout(predicate::str::contains("libA: minor"));

    monover(&repo)
        .args(["status", "--no-diff"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending changesets: 1"))
        .stdout(predicate::str::contains("libA v0.0.0 -> v0.1.0 (minor)"))
        .stdout(predicate::str::contains("libB v0.0.0 -> v0.0.1 (patch, dependency)"));
}

#[test]
fn test_status_json() {
    let repo = go_repo();
    monover(&repo).arg("init").assert().success();
    monover(&repo)
        .args(["add", "-m", "libB:patch", "-s", "Fix retry"])
        .assert()
        .success();

    let output = monover(&repo)
        .args(["status", "--no-diff", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["changesets"].as_array().unwrap().len(), 1);
    assert_eq!(value["releases"][0]["module"], "libB");
    assert_eq!(value["releases"][0]["version"], "v0.0.1");
    assert!(value.get("unreleasedChanges").is_none());
}

#[test]
fn test_add_without_init_is_usage_error() {
    let repo = go_repo();
    monover(&repo)
        .args(["add", "-m", "libA:minor", "-s", "x"])
        .assert()
        .code(2);
}

#[test]
fn test_add_unknown_module_is_usage_error() {
    let repo = go_repo();
    monover(&repo).arg("init").assert().success();
    monover(&repo)
        .args(["add", "-m", "libZ:minor", "-s", "x"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("libZ"));
}

#[test]
fn test_publish_without_manifest_fails() {
    let repo = go_repo();
    monover(&repo).arg("init").assert().success();
    monover(&repo).arg("publish").assert().code(1);
}

#[test]
fn test_log_filter_is_applied() {
    let repo = go_repo();
    monover(&repo)
        .args(["--log-filter", "monover=info", "init"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Initialized changeset store"));

    monover(&repo)
        .args(["--log-filter", "monover=notalevel", "status", "--no-diff"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to create tracing filter"));
}
