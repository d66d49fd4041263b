//! CLI Integration Tests
//!
//! Tests for `DocQL` CLI commands using `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get the CLI binary command
#[allow(deprecated)]
fn docql_cmd() -> Command {
    let mut cmd = Command::cargo_bin("docql").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Writes a config with a small vector dimension and returns its directory.
fn small_config() -> (TempDir, std::path::PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("docql.toml");
    fs::write(
        &path,
        "[document]\nmax_depth = 4\nvector_dimension = 3\n\n[search]\ndefault_limit = 5\n",
    )
    .unwrap();
    (temp_dir, path)
}

// =============================================================================
// Help & Version Tests
// =============================================================================

#[test]
fn test_help_displays_usage() {
    docql_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("DocQL CLI"))
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_displays_version() {
    docql_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("docql"));
}

#[test]
fn test_invalid_command_shows_error() {
    docql_cmd()
        .arg("invalid_command_xyz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_missing_config_file_fails() {
    docql_cmd()
        .args(["--config", "/nonexistent/docql.toml"])
        .args(["compile", "--collection", "articles", r#"{"a": 1}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

// =============================================================================
// Compile Command Tests
// =============================================================================

#[test]
fn test_compile_contains_is_pushed_down() {
    docql_cmd()
        .args([
            "compile",
            "--collection",
            "articles",
            r#"{"tags": {"$contains": "web"}}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("tags $contains: push-down"))
        .stdout(predicate::str::contains("p1 LIKE ?"))
        .stdout(predicate::str::contains("'[%]'"))
        .stdout(predicate::str::contains("'web'"))
        .stdout(predicate::str::contains("LOCAL_QUORUM"));
}

#[test]
fn test_compile_not_equal_runs_in_memory() {
    docql_cmd()
        .args([
            "compile",
            "--collection",
            "articles",
            r#"{"status": {"$ne": "archived"}}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("status $ne: in-memory"))
        .stdout(predicate::str::contains("candidates: SELECT"));
}

#[test]
fn test_compile_uses_keyspace_override() {
    docql_cmd()
        .args([
            "compile",
            "--keyspace",
            "shop",
            "--collection",
            "products",
            r#"{"price": {"$gt": 10}}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("FROM shop.products"));
}

#[test]
fn test_compile_invalid_filter_fails() {
    docql_cmd()
        .args([
            "compile",
            "--collection",
            "articles",
            r#"{"price": {"$between": [1, 2]}}"#,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DOCQL-001"));
}

#[test]
fn test_compile_json_output() {
    let output = docql_cmd()
        .args([
            "--format",
            "json",
            "compile",
            "--collection",
            "articles",
            r#"{"name": {"$eq": "Pen"}, "tags": {"$exists": true}}"#,
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let plans: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let plans = plans.as_array().unwrap();
    assert_eq!(plans.len(), 2);
    let kinds: Vec<&str> = plans.iter().map(|p| p["plan"].as_str().unwrap()).collect();
    assert!(kinds.contains(&"push_down"));
    assert!(kinds.contains(&"in_memory"));
}

// =============================================================================
// Vector Command Tests
// =============================================================================

#[test]
fn test_vector_prints_ann_query_and_inline_form() {
    let (_dir, config) = small_config();

    docql_cmd()
        .arg("--config")
        .arg(&config)
        .args([
            "vector",
            "--collection",
            "articles",
            r#"{"vector": [0.1, 0.2, 0.3]}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ANN query (limit 5):"))
        .stdout(predicate::str::contains("ANN OF ?"))
        .stdout(predicate::str::contains("ANN OF [0.1, 0.2, 0.3]"));
}

#[test]
fn test_vector_with_filter_mentions_pre_filter() {
    let (_dir, config) = small_config();

    docql_cmd()
        .arg("--config")
        .arg(&config)
        .args([
            "vector",
            "--collection",
            "articles",
            r#"{"vector": [0.1, 0.2, 0.3], "limit": 3, "filter": {"genre": {"$eq": "fiction"}}}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("pre-filter: 1 expression(s)"));
}

#[test]
fn test_vector_dimension_mismatch_fails() {
    let (_dir, config) = small_config();

    docql_cmd()
        .arg("--config")
        .arg(&config)
        .args([
            "vector",
            "--collection",
            "articles",
            r#"{"vector": [0.1, 0.2]}"#,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DOCQL-003"));
}

#[test]
fn test_vector_dimension_from_environment() {
    docql_cmd()
        .env("DOCQL_DOCUMENT__VECTOR_DIMENSION", "2")
        .args([
            "vector",
            "--collection",
            "articles",
            r#"{"vector": [1.0, 0.5], "limit": 2}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ANN OF [1.0, 0.5]"));
}

#[test]
fn test_vector_limit_above_maximum_fails() {
    let (_dir, config) = small_config();

    docql_cmd()
        .arg("--config")
        .arg(&config)
        .args([
            "vector",
            "--collection",
            "articles",
            r#"{"vector": [0.1, 0.2, 0.3], "limit": 100000}"#,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DOCQL-005"));
}

// =============================================================================
// Rewrite Command Tests
// =============================================================================

#[test]
fn test_rewrite_each_layout() {
    for layout in ["flat", "prefixed", "collection"] {
        docql_cmd()
            .args([
                "rewrite",
                "SELECT * FROM ks.t ORDER BY v ANN OF ? LIMIT 5",
                "--vector",
                "0.1,0.2,0.3",
                "--layout",
                layout,
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "SELECT * FROM ks.t ORDER BY v ANN OF [0.1, 0.2, 0.3] LIMIT 5",
            ))
            .stdout(predicate::str::contains("remaining values: 0"));
    }
}

#[test]
fn test_rewrite_keeps_other_parameters() {
    docql_cmd()
        .args([
            "rewrite",
            "SELECT * FROM ks.t WHERE p0 = ? ORDER BY v ANN OF ? LIMIT 5",
            "--vector",
            "-1.5,2",
            "--param",
            "embedding",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("WHERE p0 = ? ORDER BY v ANN OF [-1.5, 2.0]"))
        .stdout(predicate::str::contains("remaining values: 1"));
}

#[test]
fn test_rewrite_missing_param_fails() {
    docql_cmd()
        .args([
            "rewrite",
            "SELECT * FROM ks.t WHERE p0 = ? ORDER BY v ANN OF ?",
            "--vector",
            "0.1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No --param given for marker 0"));
}

#[test]
fn test_rewrite_unknown_layout_fails() {
    docql_cmd()
        .args([
            "rewrite",
            "SELECT * FROM ks.t ORDER BY v ANN OF ?",
            "--vector",
            "0.1",
            "--layout",
            "packed",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown vector layout"));
}

#[test]
fn test_rewrite_json_output() {
    let output = docql_cmd()
        .args([
            "-f",
            "json",
            "rewrite",
            "SELECT * FROM ks.t ORDER BY v ANN OF ?",
            "--vector",
            "0.5",
            "--layout",
            "collection",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let out: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(out["query"], "SELECT * FROM ks.t ORDER BY v ANN OF [0.5]");
    assert_eq!(out["rewritten"], true);
    assert_eq!(out["layout"], "collection");
}
