//! End-to-end runs of the `stampede` binary against a mock API

use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use wiremock::matchers::{any, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TINY_CONFIG: &str = r#"
profiles:
  overrides:
    SMOKE:
      virtual_users: 1
      duration: 1s
      description: tiny
scenarios:
  think_time: 50ms
  crud_step_pause: 10ms
"#;

fn stampede(args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_stampede"));
    command
        .args(args)
        .env_remove("PROFILE")
        .env_remove("HOST")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    command
}

async fn run(mut command: Command) -> Output {
    tokio::task::spawn_blocking(move || command.output().unwrap())
        .await
        .unwrap()
}

fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("stampede.yaml");
    std::fs::write(&path, TINY_CONFIG).unwrap();
    path
}

fn result_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().to_string())
                .filter(|name| name.ends_with(".json"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn test_help_lists_flags() {
    let output = stampede(&["--help"]).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-h, --host"), "{}", stdout);
    assert!(stdout.contains("--parallel"));
    assert!(stdout.contains("--log-level"));
}

#[test]
fn test_unknown_test_is_rejected() {
    let output = stampede(&["-t", "soak"]).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown test 'soak'"));
}

#[test]
fn test_unknown_profile_is_rejected() {
    let output = stampede(&["-p", "EXTREME"]).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("EXTREME"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_passing_run_writes_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"items": [{"id": 1, "name": "lamp", "price": 12.5}]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/products/\d+$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 3, "name": "desk", "price": 99})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let results = dir.path().join("results");

    let output = run(stampede(&[
        "--config",
        config.to_str().unwrap(),
        "-h",
        &server.uri(),
        "-t",
        "get-endpoint",
        "-o",
        results.to_str().unwrap(),
        "--log-level",
        "warn",
    ]))
    .await;

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        stdout,
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("get-endpoint"));
    assert!(stdout.contains("All 1 test(s) passed"));

    let files = result_files(&results);
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("get-endpoint_"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(results.join(&files[0])).unwrap()).unwrap();
    assert_eq!(report["test"], "get-endpoint");
    assert_eq!(report["passed"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failing_run_exits_non_zero() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "down"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let output = run(stampede(&[
        "--config",
        config.to_str().unwrap(),
        "-h",
        &server.uri(),
        "-t",
        "post-endpoint",
        "-o",
        dir.path().to_str().unwrap(),
        "--log-level",
        "error",
    ]))
    .await;

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("FAILED"), "{}", stdout);

    let files = result_files(dir.path());
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("post-endpoint_"));
}
