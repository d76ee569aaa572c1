//! Integration tests for standardized exit codes
//!
//! Tests that the CLI returns appropriate exit codes for different error scenarios.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn issue_batch(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("issue-batch"));
    cmd.current_dir(dir.path());
    cmd
}

fn write_batch(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("issues.md");
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_exit_code_success() {
    let dir = TempDir::new().unwrap();
    let file = write_batch(&dir, "## [A] Only issue\n");

    issue_batch(&dir)
        .args(["validate", "-f", &file])
        .assert()
        .code(0);
}

#[test]
fn test_exit_code_missing_file() {
    let dir = TempDir::new().unwrap();

    issue_batch(&dir)
        .args(["validate", "-f", "nope.md"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("failed to read nope.md"));
}

#[test]
fn test_errors_are_reported_on_stderr_only() {
    let dir = TempDir::new().unwrap();
    let file = write_batch(&dir, "## [A] a\nRelated: Z\n");

    issue_batch(&dir)
        .args(["validate", "-f", &file])
        .assert()
        .code(4)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::starts_with("Error: "))
        .stderr(predicate::str::contains(
            "issue A relates to non-existent issue Z",
        ));
}

#[test]
fn test_exit_code_missing_config() {
    let dir = TempDir::new().unwrap();
    let file = write_batch(&dir, "## [A] Only issue\n");

    issue_batch(&dir)
        .args(["validate", "--config", "missing.toml", "-f", &file])
        .assert()
        .code(3);
}

#[test]
fn test_exit_code_circular_dependency() {
    let dir = TempDir::new().unwrap();
    let file = write_batch(&dir, "## [A] a\nDepends: B\n\n## [B] b\nDepends: A\n");

    issue_batch(&dir)
        .args(["validate", "-f", &file])
        .assert()
        .code(4)
        .stderr(predicate::str::contains(
            "circular dependency detected: B -> A",
        ));
}

#[test]
fn test_exit_code_missing_reference() {
    let dir = TempDir::new().unwrap();
    let file = write_batch(&dir, "## [A] a\nBlocks: Z\n");

    issue_batch(&dir)
        .args(["order", "-f", &file])
        .assert()
        .code(4)
        .stderr(predicate::str::contains(
            "issue A blocks non-existent issue Z",
        ));
}

#[test]
fn test_exit_code_duplicate_id() {
    let dir = TempDir::new().unwrap();
    let file = write_batch(&dir, "## [A] one\n\n## [A] two\n");

    issue_batch(&dir)
        .args(["plan", "-f", &file])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("duplicate issue ID found: A"));
}

#[test]
fn test_exit_code_invalid_header() {
    let dir = TempDir::new().unwrap();
    let file = write_batch(&dir, "## A without brackets\n");

    issue_batch(&dir)
        .args(["validate", "-f", &file])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("line 1: invalid header format"));
}

#[test]
fn test_exit_code_invalid_argument() {
    let dir = TempDir::new().unwrap();

    issue_batch(&dir).args(["order"]).assert().code(2);

    issue_batch(&dir)
        .args(["validate", "-f", "issues.md", "--repo", "no-slash"])
        .assert()
        .code(2);
}

#[test]
fn test_json_error_document() {
    let dir = TempDir::new().unwrap();
    let file = write_batch(&dir, "## [A] a\nDepends: GHOST\n");

    let output = issue_batch(&dir)
        .args(["order", "--json", "-f", &file])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "MISSING_REFERENCE");
    assert_eq!(json["metadata"]["command"], "order");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("issue A depends on non-existent issue GHOST"));
}
