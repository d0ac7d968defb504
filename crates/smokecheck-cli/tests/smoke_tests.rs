//! Smoke tests for the smokecheck CLI
//!
//! These tests exercise argument handling and configuration without
//! launching a browser.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the smokecheck binary
fn smokecheck() -> Command {
    let mut cmd = Command::cargo_bin("smokecheck").expect("smokecheck binary should exist");
    cmd.env_remove("SMOKECHECK_BASE_URL")
        .env_remove("SMOKECHECK_HEADLESS")
        .env_remove("SMOKECHECK_OUTPUT_DIR")
        .env_remove("SMOKECHECK_CONFIG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    smokecheck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    smokecheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("habr.com"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_no_args_shows_help() {
    smokecheck().assert().failure(); // Requires a subcommand
}

#[test]
fn test_run_subcommand_help() {
    smokecheck()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--scenario"))
        .stdout(predicate::str::contains("--fail-fast"));
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_list_scenarios() {
    smokecheck()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("main-page"))
        .stdout(predicate::str::contains("main-menu"))
        .stdout(predicate::str::contains("login"));
}

#[test]
fn test_unknown_scenario_rejected() {
    smokecheck()
        .args(["run", "--scenario", "footer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("footer"));
}

#[test]
fn test_invalid_base_url_fails_before_launch() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("results");
    smokecheck()
        .args(["run", "--base-url", "habr.com", "--output"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_url"));
    assert!(!out.exists());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_shows_defaults() {
    smokecheck()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://habr.com"))
        .stdout(predicate::str::contains("locale: ru-RU"));
}

#[test]
fn test_config_file_and_env_layering() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("smokecheck.yaml");
    fs::write(&file, "base_url: https://staging.habr.com\ntimeouts:\n  element_ms: 7000\n").unwrap();

    smokecheck()
        .args(["config", "--config"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("https://staging.habr.com"))
        .stdout(predicate::str::contains("element_ms: 7000"));

    smokecheck()
        .args(["config", "--config"])
        .arg(&file)
        .env("SMOKECHECK_BASE_URL", "https://habr.example")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://habr.example"));
}

#[test]
fn test_broken_config_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("smokecheck.yaml");
    fs::write(&file, "timeouts: [not, a, map]\n").unwrap();

    smokecheck()
        .args(["config", "--config"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
