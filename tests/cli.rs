//! Binary-level tests.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

fn nsync(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nsync").unwrap();
    cmd.current_dir(dir)
        .env_remove("NOTION_TOKEN")
        .env_remove("NOTIONSYNC_CONFIG")
        .env_remove("NOTION_API_BASE")
        .env_remove("RUST_LOG")
        .arg("--no-color");
    for proxy in ["HTTP_PROXY", "HTTPS_PROXY", "ALL_PROXY", "http_proxy", "https_proxy", "all_proxy"] {
        cmd.env_remove(proxy);
    }
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn stderr_json(output: &std::process::Output) -> Value {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = stderr.lines().rev().find(|l| l.starts_with('{')).unwrap();
    serde_json::from_str(line).unwrap()
}

#[test]
fn test_version() {
    let temp_dir = TempDir::new().unwrap();
    let output = nsync(temp_dir.path()).arg("version").assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).into_owned();
    assert!(stdout.starts_with("nsync version "));

    let output = nsync(temp_dir.path())
        .args(["version", "--json"])
        .assert()
        .success();
    let json = stdout_json(output.get_output());
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["notion_api"], "2022-06-28");
}

#[test]
fn test_completions() {
    let temp_dir = TempDir::new().unwrap();
    let output = nsync(temp_dir.path())
        .args(["completions", "bash"])
        .assert()
        .success();
    assert!(String::from_utf8_lossy(&output.get_output().stdout).contains("nsync"));
}

#[test]
fn test_status_reads_local_state() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("notion.json"),
        r#"{"databases_id": ["db1"], "extension": "md"}"#,
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("notion_offset.json"),
        r#"{"r1": "2024-06-17T03:44:00.000Z", "r2": "2024-07-01T09:00:00.000Z"}"#,
    )
    .unwrap();
    let blog = temp_dir.path().join("data").join("blog");
    fs::create_dir_all(&blog).unwrap();
    fs::write(blog.join("Hello.md"), "---\n---\n\n").unwrap();
    fs::write(blog.join("notes.txt"), "ignored").unwrap();

    let output = nsync(temp_dir.path())
        .args(["status", "--json"])
        .assert()
        .success();
    let json = stdout_json(output.get_output());
    assert_eq!(json["config_found"], true);
    assert_eq!(json["databases"][0], "db1");
    assert_eq!(json["status"]["tracked_records"], 2);
    assert_eq!(json["status"]["newest_edit"], "2024-07-01T09:00:00.000Z");
    assert_eq!(json["status"]["documents"], 1);
}

#[test]
fn test_sync_without_token_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("notion.json"), r#"{"databases_id": ["db1"]}"#).unwrap();

    let output = nsync(temp_dir.path())
        .args(["sync", "--json"])
        .assert()
        .code(7);
    let json = stderr_json(output.get_output());
    assert_eq!(json["error"]["code"], "MISSING_TOKEN");
    assert!(!temp_dir.path().join("notion_offset.json").exists());
}

#[test]
fn test_sync_with_corrupt_offsets_fails_before_fetching() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("notion.json"), r#"{"databases_id": ["db1"]}"#).unwrap();
    let offsets = temp_dir.path().join("notion_offset.json");
    fs::write(&offsets, "[1, 2").unwrap();

    let output = nsync(temp_dir.path())
        .args(["sync", "--json", "--token", "secret"])
        .assert()
        .code(6);
    let json = stderr_json(output.get_output());
    assert_eq!(json["error"]["code"], "CORRUPT_OFFSET_STORE");
    assert_eq!(fs::read_to_string(&offsets).unwrap(), "[1, 2");
}

#[test]
fn test_sync_with_unreachable_api_reports_partial_failure() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("notion.json"), r#"{"databases_id": ["db1"]}"#).unwrap();

    let output = nsync(temp_dir.path())
        .args(["sync", "--json", "--token", "secret", "--api-base", "http://127.0.0.1:9/v1"])
        .assert()
        .code(10);

    let report = stdout_json(output.get_output());
    assert_eq!(report["success"], false);
    assert_eq!(report["totals"]["unavailable_databases"], 1);
    assert!(report["databases"][0]["source_error"].is_string());

    let offsets = fs::read_to_string(temp_dir.path().join("notion_offset.json")).unwrap();
    assert_eq!(offsets, "{}\n");
}

#[test]
fn test_dry_run_touches_nothing() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("notion.json"), r#"{"databases_id": []}"#).unwrap();

    let output = nsync(temp_dir.path())
        .env("NOTION_TOKEN", "secret")
        .args(["sync", "--dry-run", "--json"])
        .assert()
        .success();

    let report = stdout_json(output.get_output());
    assert_eq!(report["dry_run"], true);
    assert!(!temp_dir.path().join("data").exists());
    assert!(!temp_dir.path().join("notion_offset.json").exists());
}

#[test]
fn test_invalid_config_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("custom.json");
    fs::write(&config, r#"{"databases_id": ["db1"], "page_size": 500}"#).unwrap();

    nsync(temp_dir.path())
        .args(["status", "--config"])
        .arg(&config)
        .assert()
        .code(7);
}
