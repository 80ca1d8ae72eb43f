#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

/// Contract tests for `rkjm test`

fn write_executable(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Test package whose fake host binary runs `body`
fn test_package(body: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let executable = root.join("robotkernel");
    write_executable(&executable, body);

    fs::write(
        root.join("recipe.toml"),
        format!(
            "schema_version = 5\nname = \"module_jitter_measurement\"\n\n[test_package]\nconfig = \"mod_test.rkc\"\nexecutable = \"{}\"\n",
            executable.display()
        ),
    )
    .unwrap();
    fs::write(root.join("mod_test.rkc"), "modules:\n  - name: jitter\n").unwrap();
    temp_dir
}

#[test]
fn test_native_run_passes() {
    let temp_dir = test_package(r#"[ "$1" = "--test-run" ] && [ "$3" = "./mod_test.rkc" ] && [ -f "$3" ]"#);

    let mut cmd = Command::cargo_bin("rkjm").unwrap();
    cmd.current_dir(&temp_dir)
        .arg("test")
        .assert()
        .success()
        .stdout(predicate::str::contains("Test package passed"));

    assert!(temp_dir.path().join("build/mod_test.rkc").is_file());
}

#[test]
fn test_exit_code_propagated_unchanged() {
    let temp_dir = test_package("exit 42");

    let mut cmd = Command::cargo_bin("rkjm").unwrap();
    cmd.current_dir(&temp_dir)
        .arg("test")
        .assert()
        .code(42)
        .stdout(predicate::str::contains("exit code 42"));
}

#[test]
fn test_cross_build_skipped() {
    let temp_dir = test_package("exit 1");

    let mut cmd = Command::cargo_bin("rkjm").unwrap();
    cmd.current_dir(&temp_dir)
        .args(["test", "--target-arch", "sparc64-not-the-host"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipping run cross built package"))
        .stderr(predicate::str::contains("Skipping run cross built package"));
}

#[test]
fn test_json_outcome() {
    let temp_dir = test_package("exit 5");

    let output = Command::cargo_bin("rkjm")
        .unwrap()
        .current_dir(&temp_dir)
        .args(["test", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["outcome"], "failed");
    assert_eq!(json["exit_code"], 5);
    assert_eq!(json["package"], "module_jitter_measurement");
}

#[test]
fn test_missing_config_is_error() {
    let temp_dir = test_package("exit 0");
    fs::remove_file(temp_dir.path().join("mod_test.rkc")).unwrap();

    let mut cmd = Command::cargo_bin("rkjm").unwrap();
    cmd.current_dir(&temp_dir)
        .arg("test")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("mod_test.rkc"));
}
