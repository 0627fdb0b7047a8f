//! Integration tests for the `edujobs` CLI binary.
//!
//! Argument parsing, help output, shell completions and local validation
//! run without a backend. Request flows run against a wiremock server in
//! an isolated home directory.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `edujobs` binary with env isolation.
///
/// Clears all `EDUJOBS_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn edujobs_cmd() -> assert_cmd::Command {
    home_cmd(Path::new("/tmp/edujobs-cli-test-nonexistent"))
}

/// Like [`edujobs_cmd`], rooted at `home` so config and sessions persist
/// between invocations.
fn home_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("edujobs");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local/share"))
        .env("NO_COLOR", "1")
        .env_remove("EDUJOBS_PROFILE")
        .env_remove("EDUJOBS_API_URL")
        .env_remove("EDUJOBS_OUTPUT")
        .env_remove("EDUJOBS_INSECURE")
        .env_remove("EDUJOBS_TIMEOUT")
        .env_remove("EDUJOBS_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run a prepared command off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn api_url(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = edujobs_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    edujobs_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("teaching jobs")
            .and(predicate::str::contains("auth"))
            .and(predicate::str::contains("jobs"))
            .and(predicate::str::contains("applications")),
    );
}

#[test]
fn test_version_flag() {
    edujobs_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("edujobs"));
}

#[test]
fn test_invalid_subcommand() {
    edujobs_cmd()
        .arg("teleport")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_unknown_content_kind() {
    edujobs_cmd()
        .args(["content", "memes", "list"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unknown content kind"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    edujobs_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    edujobs_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    edujobs_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete"));
}

// ── Local validation (no request is sent) ───────────────────────────

#[test]
fn test_login_rejects_malformed_email() {
    edujobs_cmd()
        .args(["--ephemeral", "auth", "login", "not-an-email", "--password", "x"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Enter a valid email address"));
}

#[test]
fn test_verify_otp_requires_six_digits() {
    edujobs_cmd()
        .args(["--ephemeral", "auth", "verify-otp", "t@school.org", "12ab"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("6 digits"));
}

#[test]
fn test_signup_employer_requires_institution() {
    edujobs_cmd()
        .args([
            "--ephemeral",
            "auth",
            "signup",
            "--name",
            "Dana",
            "--email",
            "dana@district.org",
            "--role",
            "employer",
            "--password",
            "longenough1",
        ])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Institution is required"));
}

#[test]
fn test_destructive_command_needs_yes_without_tty() {
    edujobs_cmd()
        .args(["--ephemeral", "jobs", "delete", "j1"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn test_unknown_endpoint() {
    edujobs_cmd()
        .args(["--ephemeral", "api", "query", "getNothing"])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("Unknown endpoint 'getNothing'"));
}

#[test]
fn test_endpoint_listing() {
    edujobs_cmd()
        .args(["--ephemeral", "-o", "plain", "api", "endpoints"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("applyToJob")
                .and(predicate::str::contains("deleteCarouselSlide"))
                .and(predicate::str::contains("getCurrentUser")),
        );
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_set_and_profiles() {
    let home = tempfile::tempdir().unwrap();

    home_cmd(home.path())
        .args(["config", "set", "api_url", "https://jobs.example.org/api"])
        .assert()
        .success();

    home_cmd(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));

    home_cmd(home.path())
        .args(["-o", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://jobs.example.org/api"));
}

#[test]
fn test_config_rejects_bad_values() {
    let home = tempfile::tempdir().unwrap();

    home_cmd(home.path())
        .args(["config", "set", "timeout", "soon"])
        .assert()
        .failure()
        .code(2);

    home_cmd(home.path())
        .args(["config", "use", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile 'missing' not found"));
}

#[test]
fn test_unknown_profile_flag() {
    edujobs_cmd()
        .args(["--profile", "nowhere", "jobs", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile 'nowhere' not found"));
}

// ── Backend flows ───────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_jobs_list_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "_id": "j1", "title": "Physics Teacher", "location": "Leeds" },
                { "_id": "j2", "title": "Librarian" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = edujobs_cmd();
    cmd.args(["--ephemeral", "--api-url", &api_url(&server), "-o", "json", "jobs", "list"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed[0]["id"], "j1");
    assert_eq!(listed[0]["title"], "Physics Teacher");
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_duplicate_application_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/j1/apply"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({ "message": "You have already applied to this job" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = edujobs_cmd();
    cmd.args(["--ephemeral", "--api-url", &api_url(&server), "applications", "apply", "j1"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(6));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("You have already applied to this job"),
        "stderr:\n{stderr}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_persists_session_between_runs() {
    let server = MockServer::start().await;
    let home = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "kim@school.org", "password": "s3cret-pass" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "_id": "u1", "email": "kim@school.org", "role": "teacher", "name": "Kim" },
            "token": "jwt-kim"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("Authorization", "Bearer jwt-kim"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "_id": "u1", "email": "kim@school.org", "role": "teacher", "name": "Kim" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = api_url(&server);

    let mut login = home_cmd(home.path());
    login
        .args(["--api-url", &url, "auth", "login", "kim@school.org"])
        .env("EDUJOBS_PASSWORD", "s3cret-pass");
    let output = run(login).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Signed in as Kim"));

    let mut whoami = home_cmd(home.path());
    whoami.args(["--api-url", &url, "-o", "plain", "auth", "whoami"]);
    let output = run(whoami).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "u1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_token_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/applications/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Not authorized" })),
        )
        .mount(&server)
        .await;

    let mut cmd = edujobs_cmd();
    cmd.args(["--ephemeral", "--api-url", &api_url(&server), "applications", "list"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not authorized"));
}

#[test]
fn test_unreachable_backend_exits_with_connection_code() {
    edujobs_cmd()
        .args([
            "--ephemeral",
            "--timeout",
            "2",
            "--api-url",
            "http://127.0.0.1:9/api",
            "jobs",
            "list",
        ])
        .assert()
        .failure()
        .code(7);
}
