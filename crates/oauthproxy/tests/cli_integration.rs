//! Integration tests for the oauthproxy binary.
//!
//! These only exercise startup paths that exit on their own (`--help`,
//! `--version`, `--check` and config failures); serving is covered by the
//! server crate's tests.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const COMPLETE_JSON: &str = r#"{
    "AuthServer": "https://accounts.example.com/o/oauth2/auth",
    "TokenServer": "https://accounts.example.com/o/oauth2/token",
    "ClientID": "real-id",
    "ClientSecret": "real-secret",
    "IncomingClientID": "abc",
    "IncomingClientSecret": "shared-secret",
    "BindAddress": "127.0.0.1:53681",
    "Name": "Test Proxy"
}"#;

/// Get a command for the oauthproxy binary with the environment cleared of
/// anything that would change config loading.
fn oauthproxy() -> Command {
    let mut cmd = Command::cargo_bin("oauthproxy").unwrap();
    cmd.env_remove("OAUTHPROXY_CONFIG")
        .env_remove("OAUTHPROXY_CLIENT_SECRET")
        .env_remove("OAUTHPROXY_INCOMING_CLIENT_SECRET")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn check(path: &Path) -> assert_cmd::assert::Assert {
    oauthproxy()
        .arg("--config")
        .arg(path)
        .arg("--check")
        .assert()
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and version
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help() {
    oauthproxy()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--check"));
}

#[test]
fn test_version() {
    oauthproxy()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("oauthproxy"));
}

#[test]
fn test_unknown_flag_fails() {
    oauthproxy().arg("--no-such-flag").assert().failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Config checking
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_check_valid_json_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "proxy.json", COMPLETE_JSON);

    check(&path)
        .success()
        .stdout(predicate::str::contains("Configuration OK"))
        .stdout(predicate::str::contains("127.0.0.1:53681"))
        .stdout(predicate::str::contains("real-secret").not())
        .stdout(predicate::str::contains("shared-secret").not());
}

#[test]
fn test_check_valid_toml_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "proxy.toml",
        r#"
auth_server = "https://accounts.example.com/o/oauth2/auth"
token_server = "https://accounts.example.com/o/oauth2/token"
client_id = "real-id"
client_secret = "real-secret"
incoming_client_id = "abc"
incoming_client_secret = "shared-secret"
"#,
    );

    check(&path)
        .success()
        .stdout(predicate::str::contains("oauth proxy"))
        .stdout(predicate::str::contains("0.0.0.0:53681"));
}

#[test]
fn test_check_with_bind_override() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "proxy.json", COMPLETE_JSON);

    oauthproxy()
        .arg("--config")
        .arg(&path)
        .args(["--bind", ":8099", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.0.0.0:8099"));
}

#[test]
fn test_config_from_env() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "proxy.json", COMPLETE_JSON);

    oauthproxy()
        .env("OAUTHPROXY_CONFIG", &path)
        .arg("--check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Proxy"));
}

#[test]
fn test_secret_from_env() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "proxy.json",
        r#"{
    "AuthServer": "https://accounts.example.com/o/oauth2/auth",
    "TokenServer": "https://accounts.example.com/o/oauth2/token",
    "ClientID": "real-id",
    "IncomingClientID": "abc",
    "IncomingClientSecret": "shared-secret"
}"#,
    );

    oauthproxy()
        .env("OAUTHPROXY_CLIENT_SECRET", "from-env")
        .arg("--config")
        .arg(&path)
        .arg("--check")
        .assert()
        .success()
        .stdout(predicate::str::contains("OAUTHPROXY_CLIENT_SECRET"))
        .stdout(predicate::str::contains("from-env").not());
}

// ─────────────────────────────────────────────────────────────────────────────
// Startup failures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.json");

    check(&path)
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn test_missing_keys_fail() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "proxy.json",
        r#"{"AuthServer": "https://accounts.example.com/o/oauth2/auth"}"#,
    );

    check(&path)
        .failure()
        .stderr(predicate::str::contains("missing data in config"))
        .stderr(predicate::str::contains("token_server"))
        .stderr(predicate::str::contains("incoming_client_secret"));
}

#[test]
fn test_malformed_config_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "proxy.json", "{ not json");

    check(&path)
        .failure()
        .stderr(predicate::str::contains("failed to parse JSON config"));
}

#[test]
fn test_bad_bind_address_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "proxy.json", COMPLETE_JSON);

    oauthproxy()
        .arg("--config")
        .arg(&path)
        .args(["--bind", "not an address", "--check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid bind address"));
}
