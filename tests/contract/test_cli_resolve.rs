use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Contract tests for `rkjm resolve`

const RECIPE: &str = r#"
schema_version = 5
name = "module_jitter_measurement"
description = "robotkernel jitter measurement module."
base = "conan_template/[^5.0.6]@robotkernel/stable"
requires = [
    "robotkernel/[~5]@robotkernel/stable",
    "service_provider_process_data_inspection/[~5]@robotkernel/stable",
]
"#;

const CATALOG: &str = r#"
[packages]
robotkernel = ["4.2.0", "5.0.0", "5.3.2", "6.0.0"]
service_provider_process_data_inspection = ["5.1.0"]
conan_template = ["5.0.6"]
"#;

fn setup(catalog: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("recipe.toml"), RECIPE).unwrap();
    fs::write(temp_dir.path().join("catalog.toml"), catalog).unwrap();
    temp_dir
}

#[test]
fn test_resolve_satisfiable() {
    let temp_dir = setup(CATALOG);

    let mut cmd = Command::cargo_bin("rkjm").unwrap();
    cmd.current_dir(&temp_dir)
        .arg("resolve")
        .assert()
        .success()
        .stdout(predicate::str::contains("robotkernel 5.3.2 (~5)"))
        .stdout(predicate::str::contains("conan_template 5.0.6 (^5.0.6)"));
}

#[test]
fn test_resolve_json() {
    let temp_dir = setup(CATALOG);

    let output = Command::cargo_bin("rkjm")
        .unwrap()
        .current_dir(&temp_dir)
        .args(["resolve", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["resolved"].as_array().unwrap().len(), 3);
    assert!(json["failed"].as_array().unwrap().is_empty());
}

#[test]
fn test_resolve_unsatisfiable_fails() {
    let temp_dir = setup(
        r#"
[packages]
robotkernel = ["4.2.0", "6.0.0"]
service_provider_process_data_inspection = ["5.1.0"]
conan_template = ["5.0.6"]
"#,
    );

    let mut cmd = Command::cargo_bin("rkjm").unwrap();
    cmd.current_dir(&temp_dir)
        .arg("resolve")
        .assert()
        .code(3)
        .stdout(predicate::str::contains("No version of 'robotkernel' satisfies ~5"))
        .stderr(predicate::str::contains("cannot be satisfied"));
}

#[test]
fn test_resolve_explicit_catalog_path() {
    let temp_dir = setup(CATALOG);
    fs::rename(
        temp_dir.path().join("catalog.toml"),
        temp_dir.path().join("packages.toml"),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("rkjm").unwrap();
    cmd.current_dir(&temp_dir)
        .args(["resolve", "--catalog", "packages.toml"])
        .assert()
        .success();
}
