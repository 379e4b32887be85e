//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. They run
//! against the dev data directory (STUDYRANK_ENV=dev), never production data.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "studyrank-cli", "--"])
        .args(args)
        .env("STUDYRANK_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_rank_show() {
    let (stdout, _, code) = run_cli(&["rank", "show"]);
    assert_eq!(code, 0, "rank show failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("rank show not JSON");
    assert!(parsed["tier_name"].is_string());
    assert!(parsed["rank_point"].is_number());
}

#[test]
fn test_rank_ladder() {
    let (stdout, _, code) = run_cli(&["rank", "ladder"]);
    assert_eq!(code, 0, "rank ladder failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("ladder not JSON");
    let tiers = parsed.as_array().expect("ladder not an array");
    assert_eq!(tiers.len(), 20);
    assert_eq!(tiers[0]["name"], "Rookie");
}

#[test]
fn test_rank_apply_is_idempotent_within_a_day() {
    let (_, _, code) = run_cli(&["rank", "apply"]);
    assert_eq!(code, 0, "first rank apply failed");
    let (stdout, _, code) = run_cli(&["rank", "apply"]);
    assert_eq!(code, 0, "second rank apply failed");
    // The second run on the same date must report the gate, not a new update.
    assert!(stdout.contains("already applied today") || stdout.contains("\"applied\": false"));
}

#[test]
fn test_session_status() {
    let (stdout, _, code) = run_cli(&["session", "status"]);
    assert_eq!(code, 0, "session status failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("status not JSON");
    assert!(parsed["active"].is_boolean());
}

#[test]
fn test_stats_today() {
    let (stdout, _, code) = run_cli(&["stats", "today"]);
    assert_eq!(code, 0, "stats today failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("stats not JSON");
    assert!(parsed["today_minutes"].is_number());
}

#[test]
fn test_stats_all() {
    let (_, _, code) = run_cli(&["stats", "all"]);
    assert_eq!(code, 0, "stats all failed");
}

#[test]
fn test_stats_subjects() {
    let (stdout, _, code) = run_cli(&["stats", "subjects"]);
    assert_eq!(code, 0, "stats subjects failed");
    assert!(serde_json::from_str::<serde_json::Value>(&stdout)
        .map(|v| v.is_array())
        .unwrap_or(false));
}

#[test]
fn test_log_list() {
    let (stdout, _, code) = run_cli(&["log", "list"]);
    assert_eq!(code, 0, "log list failed");
    assert!(serde_json::from_str::<serde_json::Value>(&stdout)
        .map(|v| v.is_array())
        .unwrap_or(false));
}

#[test]
fn test_config_get() {
    let (stdout, _, code) = run_cli(&["config", "get", "profile.username"]);
    assert_eq!(code, 0, "config get failed");
    assert!(!stdout.trim().is_empty());
}

#[test]
fn test_config_set() {
    let (_, _, code) = run_cli(&["config", "set", "timer.default_subject", "General"]);
    assert_eq!(code, 0, "config set failed");
}

#[test]
fn test_config_list() {
    let (stdout, _, code) = run_cli(&["config", "list"]);
    assert_eq!(code, 0, "config list failed");
    assert!(stdout.contains("[profile]"));
}

#[test]
fn test_config_get_unknown_key_fails() {
    let (_, stderr, code) = run_cli(&["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown config key"));
}
