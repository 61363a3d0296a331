//! Integration tests for the `flowdeck` CLI binary.
//!
//! These cover argument parsing, help output, shell completions, config
//! handling and error exit codes without a live orchestrator.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `flowdeck` binary with env isolation.
///
/// Clears every `AIRFLOW_*` and `FLOWDECK_*` variable the binary reads and
/// points config directories at a nonexistent path.
fn flowdeck_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("flowdeck");
    cmd.env("HOME", "/tmp/flowdeck-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/flowdeck-cli-test-nonexistent")
        .env_remove("AIRFLOW_BASE_URL")
        .env_remove("AIRFLOW_USERNAME")
        .env_remove("AIRFLOW_PASSWORD")
        .env_remove("AIRFLOW_TOKEN")
        .env_remove("FLOWDECK_CONFIG")
        .env_remove("FLOWDECK_OUTPUT")
        .env_remove("FLOWDECK_ORCHESTRATOR__BASE_URL")
        .env_remove("FLOWDECK_ORCHESTRATOR__AUTH__USERNAME")
        .env_remove("FLOWDECK_ORCHESTRATOR__AUTH__TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = flowdeck_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    flowdeck_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Airflow")
            .and(predicate::str::contains("workflows"))
            .and(predicate::str::contains("trigger"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    flowdeck_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("flowdeck"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    flowdeck_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    flowdeck_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    flowdeck_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    flowdeck_cmd()
        .args(["config", "path", "--config", "/etc/flowdeck/custom.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/etc/flowdeck/custom.toml"));
}

#[test]
fn test_config_show_masks_secrets() {
    let file = write_config(
        r#"
[orchestrator]
base_url = "https://airflow.internal:8443"

[orchestrator.auth]
type = "token"
token = "super-secret-token"
"#,
    );

    let output = flowdeck_cmd()
        .args(["config", "show", "--config"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("https://airflow.internal:8443"), "{stdout}");
    assert!(!stdout.contains("super-secret-token"), "{stdout}");
}

#[test]
fn test_missing_explicit_config_fails() {
    let output = flowdeck_cmd()
        .args(["config", "show", "--config", "/tmp/flowdeck-cli-test-nonexistent/nope.toml"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = flowdeck_cmd().arg("foobar").output().unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid subcommand"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_workflows_list_without_credentials() {
    let output = flowdeck_cmd().args(["workflows", "list"]).output().unwrap();
    assert_eq!(
        output.status.code(),
        Some(3),
        "Expected auth exit code:\n{}",
        combined_output(&output)
    );
    assert!(combined_output(&output).contains("credentials"));
}

#[test]
fn test_non_http_url_is_rejected() {
    let output = flowdeck_cmd()
        .args(["health", "--url", "ftp://airflow", "--token", "t"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
}

#[test]
fn test_trigger_rejects_non_object_conf() {
    let output = flowdeck_cmd()
        .args([
            "trigger",
            "etl",
            "--conf",
            "[1, 2]",
            "--url",
            "http://127.0.0.1:1",
            "--token",
            "t",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("conf"));
}

#[test]
fn test_pause_requires_yes_without_terminal() {
    let output = flowdeck_cmd()
        .args(["pause", "etl", "--url", "http://127.0.0.1:1", "--token", "t"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("--yes"));
}

#[test]
fn test_watch_run_requires_workflow() {
    let output = flowdeck_cmd()
        .args(["watch", "--run", "manual_1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unreachable_orchestrator() {
    let output = flowdeck_cmd()
        .args(["health", "--url", "http://127.0.0.1:1", "--token", "t"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}
