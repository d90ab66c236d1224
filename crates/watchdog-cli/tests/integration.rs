#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;

fn watchdog(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("watchdog").unwrap();
    cmd.current_dir(dir.path())
        .env("WATCHDOG_CONFIG", dir.path().join("watchdog.yaml"))
        .env_remove("WATCHDOG_TOKEN")
        .env_remove("GH_PAT_WEBHOOK");
    cmd
}

fn write_config(dir: &TempDir, yaml: &str) {
    std::fs::write(dir.path().join("watchdog.yaml"), yaml).unwrap();
}

// ---------------------------------------------------------------------------
// watchdog config
// ---------------------------------------------------------------------------

#[test]
fn config_init_writes_defaults() {
    let dir = TempDir::new().unwrap();
    watchdog(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let content = std::fs::read_to_string(dir.path().join("watchdog.yaml")).unwrap();
    assert!(content.contains("LAST_HEALTHY_COMMIT"));
    assert!(content.contains("argo-degraded"));
}

#[test]
fn config_init_does_not_overwrite_without_force() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "dispatch:\n  repository: acme/gitops\n");
    watchdog(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    let content = std::fs::read_to_string(dir.path().join("watchdog.yaml")).unwrap();
    assert!(content.contains("acme/gitops"));
}

#[test]
fn config_validate_reports_missing_repository() {
    let dir = TempDir::new().unwrap();
    watchdog(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] dispatch.repository is empty"));
}

#[test]
fn config_validate_accepts_complete_config() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "dispatch:\n  repository: acme/gitops\n  token: abc\n",
    );
    watchdog(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_show_masks_token() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "dispatch:\n  repository: acme/gitops\n  token: ghp_topsecret\n",
    );
    watchdog(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acme/gitops"))
        .stdout(predicate::str::contains("ghp_topsecret").not());
}

// ---------------------------------------------------------------------------
// watchdog checkpoint
// ---------------------------------------------------------------------------

#[test]
fn checkpoint_show_when_absent() {
    let dir = TempDir::new().unwrap();
    watchdog(&dir)
        .args(["checkpoint", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No healthy revision recorded."));
}

#[test]
fn checkpoint_set_then_show() {
    let dir = TempDir::new().unwrap();
    watchdog(&dir)
        .args(["checkpoint", "set", "good111"])
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(dir.path().join(".env")).unwrap(),
        "LAST_HEALTHY_COMMIT=good111\n"
    );

    watchdog(&dir)
        .args(["checkpoint", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"revision\": \"good111\""));
}

#[test]
fn checkpoint_respects_configured_key_and_path() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "checkpoint:\n  path: state/rev.env\n  key: GOOD_REV\n");
    watchdog(&dir)
        .args(["checkpoint", "set", "r9"])
        .assert()
        .success();

    let content = std::fs::read_to_string(dir.path().join("state/rev.env")).unwrap();
    assert_eq!(content, "GOOD_REV=r9\n");
}

#[test]
fn checkpoint_set_keeps_revision_verbatim() {
    let dir = TempDir::new().unwrap();
    watchdog(&dir)
        .args(["checkpoint", "set", " abc123 "])
        .assert()
        .success();

    watchdog(&dir)
        .args(["checkpoint", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"revision\": \" abc123 \""));
}

#[test]
fn checkpoint_set_rejects_empty_revision() {
    let dir = TempDir::new().unwrap();
    watchdog(&dir)
        .args(["checkpoint", "set", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be empty"));
}

// ---------------------------------------------------------------------------
// watchdog serve
// ---------------------------------------------------------------------------

#[test]
fn serve_refuses_invalid_config() {
    let dir = TempDir::new().unwrap();
    watchdog(&dir)
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn serve_requires_token_unless_dry_run() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "dispatch:\n  repository: acme/gitops\n");
    watchdog(&dir)
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no dispatch token"));
}

/// Port announced by the "webhook server listening on http://HOST:PORT" log line.
fn listening_port(line: &str) -> Option<u16> {
    let rest = &line[line.find("listening on http://")?..];
    let after_colon = &rest[rest.rfind(':')? + 1..];
    let digits: String = after_colon
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[test]
fn serve_dry_run_with_default_config_accepts_webhooks() {
    let dir = TempDir::new().unwrap();
    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("watchdog"))
        .current_dir(dir.path())
        .env("WATCHDOG_CONFIG", dir.path().join("watchdog.yaml"))
        .env_remove("WATCHDOG_TOKEN")
        .env_remove("GH_PAT_WEBHOOK")
        .env_remove("RUST_LOG")
        .args(["serve", "--host", "127.0.0.1", "--port", "0", "--dry-run"])
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // Keep the reader alive until the child is stopped so its log writes
    // never hit a closed pipe.
    let mut lines = BufReader::new(child.stderr.take().unwrap()).lines();
    let port = lines
        .by_ref()
        .map_while(Result::ok)
        .find_map(|line| listening_port(&line));
    let Some(port) = port else {
        let _ = child.kill();
        let _ = child.wait();
        panic!("server exited before announcing its port");
    };

    let body = r#"{"app":"guestbook","status":"Healthy","revision":"abc123"}"#;
    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    write!(
        stream,
        "POST /webhook HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
    .unwrap();
    let mut response = String::new();
    let read = stream.read_to_string(&mut response);

    let _ = child.kill();
    let _ = child.wait();
    drop(lines);

    read.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    assert!(response.contains("checkpoint_saved"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join(".env")).unwrap(),
        "LAST_HEALTHY_COMMIT=abc123\n"
    );
}
