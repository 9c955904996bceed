//! Integration tests for the `shelly-cloud` CLI binary.
//!
//! Parsing, help output, completions and config handling run without a
//! network. The end-to-end section drives the binary against a wiremock
//! Shelly Cloud.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `shelly-cloud` binary with env isolation.
///
/// Clears all `SHELLY_*` env vars and points config directories at
/// `config_home` so tests never touch the user's real configuration.
fn shelly_cmd_in(config_home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("shelly-cloud");
    cmd.env("HOME", config_home)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("SHELLY_PROFILE")
        .env_remove("SHELLY_USERNAME")
        .env_remove("SHELLY_PASSWORD")
        .env_remove("SHELLY_OUTPUT")
        .env_remove("SHELLY_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn shelly_cmd() -> assert_cmd::Command {
    shelly_cmd_in(Path::new("/tmp/shelly-cloud-cli-test-nonexistent"))
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Write `config.toml` where the binary will look for it.
fn write_config(config_home: &Path, body: &str) {
    let dir = config_home.join("shelly-cloud");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), body).unwrap();
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = shelly_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    shelly_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Shelly Cloud")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("switch"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    shelly_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("shelly-cloud"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    shelly_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shelly-cloud"));
}

#[test]
fn test_completions_zsh() {
    shelly_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    shelly_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete"));
}

// ── Argument errors ─────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = shelly_cmd().arg("frobnicate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("frobnicate"), "Expected the bad name echoed:\n{text}");
}

#[test]
fn test_invalid_output_format() {
    shelly_cmd()
        .args(["--output", "xml", "devices"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_switch_rejects_unknown_state() {
    shelly_cmd()
        .args(["switch", "abc", "toggle"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_watch_rejects_zero_interval() {
    shelly_cmd()
        .args(["watch", "--status-interval", "0s"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("greater than zero"));
}

// ── Credentials & config ────────────────────────────────────────────

#[test]
fn test_devices_without_credentials() {
    let output = shelly_cmd().arg("devices").output().unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code");
    let text = combined_output(&output);
    assert!(
        text.contains("No credentials"),
        "Expected credential hint in output:\n{text}"
    );
}

#[test]
fn test_unknown_profile_flag() {
    shelly_cmd()
        .args(["-p", "nowhere", "-u", "me@example.com", "devices"])
        .assert()
        .failure()
        .code(4);
}

#[test]
fn test_config_path() {
    shelly_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_profiles_marks_default() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        r#"
default_profile = "home"

[profiles.home]
username = "me@example.com"

[profiles.office]
username = "work@example.com"
"#,
    );

    shelly_cmd_in(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("home *").and(predicate::str::contains("office")));
}

#[test]
fn test_config_show_masks_password() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        r#"
[profiles.default]
username = "me@example.com"
password = "hunter2"
"#,
    );

    shelly_cmd_in(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****").and(predicate::str::contains("hunter2").not()));
}

#[test]
fn test_config_use_switches_default() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        r#"
[profiles.default]
username = "me@example.com"

[profiles.office]
username = "work@example.com"
"#,
    );

    shelly_cmd_in(home.path())
        .args(["config", "use", "office"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(home.path().join("shelly-cloud/config.toml")).unwrap();
    assert!(saved.contains(r#"default_profile = "office""#), "{saved}");
}

#[test]
fn test_config_use_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), "[profiles.default]\nusername = \"me@example.com\"\n");

    shelly_cmd_in(home.path())
        .args(["config", "use", "nowhere"])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("default"));
}

// ── End to end against a mock cloud ─────────────────────────────────

async fn mock_cloud() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isok": true,
            "data": { "token": "T", "user_api_url": server.uri() }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/interface/device/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isok": true,
            "data": {
                "devices": {
                    "abc": { "id": "abc", "name": "Plug", "channels_count": 1, "type": "SHPLG-S" },
                    "two": { "id": "two", "name": "Relay", "channels_count": 2, "type": "SHSW-25" }
                }
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/device/all_status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isok": true,
            "data": {
                "devices_status": {
                    "abc": {
                        "cloud": { "connected": true, "enabled": true },
                        "relays": [{ "ison": true }],
                        "power": { "value": 1500 }
                    },
                    "two": {
                        "cloud": { "connected": false, "enabled": true },
                        "relays": [{ "ison": false }, { "ison": true }]
                    }
                }
            }
        })))
        .mount(&server)
        .await;

    server
}

/// A config home whose default profile points at `server`.
fn home_for(server: &MockServer) -> tempfile::TempDir {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        &format!(
            "[profiles.default]\nusername = \"me@example.com\"\nauth_url = \"{}\"\n",
            server.uri()
        ),
    );
    home
}

/// Run the binary off the async runtime and return its output.
async fn run(home: &Path, args: &[&str]) -> std::process::Output {
    let mut cmd = shelly_cmd_in(home);
    cmd.env("SHELLY_PASSWORD", "pw").args(args);
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_plain_lists_ids() {
    let server = mock_cloud().await;
    let home = home_for(&server);

    let output = run(home.path(), &["devices", "-o", "plain"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "abc\ntwo");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_json_for_one_device() {
    let server = mock_cloud().await;
    let home = home_for(&server);

    let output = run(home.path(), &["status", "abc", "-o", "json"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["id"], "abc");
    assert_eq!(body["online"], true);
    assert_eq!(body["relays"], json!([true]));
    assert_eq!(body["sensors"][0]["kind"], "power");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_unknown_device() {
    let server = mock_cloud().await;
    let home = home_for(&server);

    let output = run(home.path(), &["status", "nope"]).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_entities_plain_lists_switches_and_sensors() {
    let server = mock_cloud().await;
    let home = home_for(&server);

    let output = run(home.path(), &["entities", "-o", "plain"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("switch.shelly_cloud_abc\ton"), "{stdout}");
    assert!(stdout.contains("sensor.shelly_cloud_abc_power\t1.50"), "{stdout}");
    assert!(stdout.contains("switch.shelly_cloud_two_1\ton"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_switch_sends_relay_command() {
    let server = mock_cloud().await;
    Mock::given(method("POST"))
        .and(path("/device/relay/control"))
        .and(body_string_contains("id=two"))
        .and(body_string_contains("channel=1"))
        .and(body_string_contains("turn=off"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "isok": true })))
        .expect(1)
        .mount(&server)
        .await;
    let home = home_for(&server);

    let output = run(home.path(), &["switch", "two", "off", "--channel", "1"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_switch_rejected_by_cloud() {
    let server = mock_cloud().await;
    Mock::given(method("POST"))
        .and(path("/device/relay/control"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isok": false,
            "errors": { "device_offline": "Device is offline" }
        })))
        .mount(&server)
        .await;
    let home = home_for(&server);

    let output = run(home.path(), &["switch", "two", "on"]).await;
    assert_eq!(output.status.code(), Some(1), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("refused"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrong_password_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isok": false,
            "errors": { "wrong_credentials": "Invalid email or password" }
        })))
        .mount(&server)
        .await;
    let home = home_for(&server);

    let output = run(home.path(), &["devices"]).await;
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}
