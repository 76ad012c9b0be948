//! Integration tests for the `conjure` CLI binary.
//!
//! Argument parsing, help output, completions and error handling run
//! without a backend; list commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `conjure` binary with env isolation.
///
/// Clears all `CONJURE_*` env vars and points config and data
/// directories at a scratch dir so tests never touch real configuration.
fn conjure_cmd(home: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("conjure");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("NO_COLOR", "1")
        .env_remove("CONJURE_PROFILE")
        .env_remove("CONJURE_API_URL")
        .env_remove("CONJURE_SITE_URL")
        .env_remove("CONJURE_OUTPUT")
        .env_remove("CONJURE_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let uri = server.uri();
    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
    tokio::task::spawn_blocking(move || {
        let home = TempDir::new().unwrap();
        conjure_cmd(&home)
            .arg("--api-url")
            .arg(uri)
            .args(args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

fn trigger(id: u32, name: &str, enabled: bool) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "condition": { "type": "event", "value": "player_join" },
        "effect_id": 1,
        "enabled": enabled,
        "created_at": "2024-06-01T08:00:00Z"
    })
}

fn effects(n: u32) -> serde_json::Value {
    (1..=n)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("Effect {i}"),
                "type": "particle",
                "parameters": {}
            })
        })
        .collect()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = conjure_cmd(&home).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    conjure_cmd(&home).arg("--help").assert().success().stdout(
        predicate::str::contains("effects")
            .and(predicate::str::contains("triggers"))
            .and(predicate::str::contains("auth")),
    );
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    conjure_cmd(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("conjure"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    conjure_cmd(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = TempDir::new().unwrap();
    conjure_cmd(&home)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_triggers_subcommands_exist() {
    let home = TempDir::new().unwrap();
    conjure_cmd(&home)
        .args(["triggers", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("toggle"))
                .and(predicate::str::contains("cancel"))
                .and(predicate::str::contains("watch")),
        );
}

#[test]
fn test_auth_subcommands_exist() {
    let home = TempDir::new().unwrap();
    conjure_cmd(&home)
        .args(["auth", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("login")
                .and(predicate::str::contains("logout"))
                .and(predicate::str::contains("reset-password")),
        );
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = TempDir::new().unwrap();
    let output = conjure_cmd(&home).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let home = TempDir::new().unwrap();
    let output = conjure_cmd(&home)
        .args(["--output", "invalid", "effects", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_unknown_profile_is_reported() {
    let home = TempDir::new().unwrap();
    conjure_cmd(&home)
        .args(["--profile", "nowhere", "effects", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nowhere"));
}

#[test]
fn test_unreachable_backend_exits_with_connection_code() {
    let home = TempDir::new().unwrap();
    conjure_cmd(&home)
        .args(["--api-url", "http://127.0.0.1:9", "--timeout", "5", "effects", "list"])
        .assert()
        .code(7);
}

#[test]
fn test_update_without_changes_is_a_usage_error() {
    let home = TempDir::new().unwrap();
    conjure_cmd(&home)
        .args(["--api-url", "http://127.0.0.1:9", "effects", "update", "3"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nothing to change"));
}

#[test]
fn test_trigger_create_requires_condition() {
    let home = TempDir::new().unwrap();
    conjure_cmd(&home)
        .args(["--api-url", "http://127.0.0.1:9", "triggers", "create", "--name", "x"])
        .assert()
        .code(2);
}

#[test]
fn test_delete_needs_yes_when_not_interactive() {
    let home = TempDir::new().unwrap();
    conjure_cmd(&home)
        .args(["--api-url", "http://127.0.0.1:9", "triggers", "delete", "4"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    // Without a file the defaults are shown.
    let home = TempDir::new().unwrap();
    conjure_cmd(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:8000"));
}

#[test]
fn test_config_path_points_at_config_toml() {
    let home = TempDir::new().unwrap();
    conjure_cmd(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_env_api_url_overrides_default() {
    let home = TempDir::new().unwrap();
    conjure_cmd(&home)
        .env("CONJURE_API_URL", "https://api.example.com")
        .args(["-o", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://api.example.com"));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_triggers_list_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/triggers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            trigger(1, "Welcome", true),
            trigger(2, "Nightfall", false),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["-o", "json", "triggers", "list"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Welcome", "Nightfall"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_trigger_list_shows_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/triggers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let output = run_against(&server, &["triggers", "list"]).await;
    assert!(output.status.success());
    assert!(
        String::from_utf8_lossy(&output.stdout)
            .contains("No triggers found. Create your first trigger to get started."),
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_effects_list_pages_and_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/magic-effects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(effects(14)))
        .mount(&server)
        .await;

    let output = run_against(&server, &["effects", "list", "--page", "2"]).await;
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Effect 13"));
    assert!(!stdout.contains("Effect 12 "));
    assert!(stdout.contains("Page 2 of 2 (14 effects)"));

    let output = run_against(&server, &["-o", "plain", "effects", "list", "-s", "effect 1"]).await;
    let ids: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_owned)
        .collect();
    assert_eq!(ids, ["1", "10", "11", "12", "13", "14"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/triggers/9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Trigger not found" })),
        )
        .mount(&server)
        .await;

    let output = run_against(&server, &["triggers", "get", "9"]).await;
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("trigger '9' not found"));
}
