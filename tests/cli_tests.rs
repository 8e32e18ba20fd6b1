#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Binary isolated from the user's config and environment
fn graph_shaper(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("graph-shaper").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("GRAPH_API_URL")
        .env_remove("GRAPH_TOKEN")
        .env("NO_COLOR", "1");
    cmd
}

/// Test that the CLI shows help
#[test]
fn test_help() {
    let home = TempDir::new().unwrap();
    graph_shaper(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Graph style REST client"));
}

/// Test that version flag works
#[test]
fn test_version() {
    let home = TempDir::new().unwrap();
    graph_shaper(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("graph-shaper"));
}

/// Test that unknown commands fail gracefully
#[test]
fn test_unknown_command() {
    let home = TempDir::new().unwrap();
    graph_shaper(&home).arg("unknown-command").assert().failure();
}

/// Test me subcommand help
#[test]
fn test_me_help() {
    let home = TempDir::new().unwrap();
    graph_shaper(&home)
        .args(["me", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed-in user operations"));
}

/// Test invalid format flag
#[test]
fn test_invalid_format() {
    let home = TempDir::new().unwrap();
    graph_shaper(&home)
        .args(["-f", "invalid", "me", "profile"])
        .assert()
        .failure();
}

/// Test config defaults are shown when no file exists
#[test]
fn test_config_show_defaults() {
    let home = TempDir::new().unwrap();
    graph_shaper(&home)
        .args(["-f", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://graph.microsoft.com"));
}

/// Test shell completions are generated
#[test]
fn test_completions() {
    let home = TempDir::new().unwrap();
    graph_shaper(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("graph-shaper"));
}

/// Test profile fetch against a mock server
#[tokio::test(flavor = "multi_thread")]
async fn test_me_profile_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me/"))
        .and(header("authorization", "Bearer cli-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u1",
            "displayName": "Ada Lovelace"
        })))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    graph_shaper(&home)
        .env("GRAPH_API_URL", server.uri())
        .env("GRAPH_TOKEN", "cli-token")
        .args(["-f", "json", "me", "profile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ada Lovelace"));
}

/// Test configured headers reach the me endpoints
#[tokio::test(flavor = "multi_thread")]
async fn test_me_profile_sends_configured_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me/"))
        .and(header("x-tenant", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1"})))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let config_dir = home.path().join(".config").join("graph-shaper");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "[api]\nversion = \"beta\"\n\n[api.headers]\nX-Tenant = \"t1\"\n",
    )
    .unwrap();

    graph_shaper(&home)
        .args(["--base-url", &server.uri(), "-f", "json", "me", "profile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("u1"));
}

/// Test API errors surface with status and body
#[tokio::test(flavor = "multi_thread")]
async fn test_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    graph_shaper(&home)
        .args(["--base-url", &server.uri(), "request", "get", "/missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API Error [404]: not found"));
}

/// Test photo falls back to an avatar
#[tokio::test(flavor = "multi_thread")]
async fn test_me_photo_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("ImageNotFound"))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    graph_shaper(&home)
        .args(["--base-url", &server.uri(), "me", "photo", "--name", "Ada L"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://ui-avatars.com/api/?rounded=true&name=Ada%20L",
        ));
}
