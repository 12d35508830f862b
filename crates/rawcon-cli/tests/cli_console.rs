#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

/// Command with an isolated database and home directory.
fn rawcon(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rawcon"));
    cmd.env("RAWCON_HOME", home)
        .env("RAWCON_DB_PATH", home.join("console.db"))
        .env_remove("RAWCON_BASE_URL")
        .env_remove("RAWCON_LOG");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    rawcon(home).args(args).output().expect("run rawcon")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// config / status
// ---------------------------------------------------------------------------

#[test]
fn base_url_is_saved_and_cleared() {
    let home = TempDir::new().unwrap();

    let out = run(home.path(), &["config", "base-url", "http://h:8000/"]);
    assert!(out.status.success());
    assert!(stderr(&out).contains("[rawcon] Saved Base URL: http://h:8000"));

    let out = run(home.path(), &["status", "--json"]);
    let status: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(status["base_url"], "http://h:8000");

    let out = run(home.path(), &["config", "base-url", "--clear"]);
    assert!(stderr(&out).contains("Saved: Base URL cleared."));
    let out = run(home.path(), &["status"]);
    assert!(stdout(&out).contains("Base URL: (relative)"));
}

#[test]
fn status_shows_unset_then_bound_campaign() {
    let home = TempDir::new().unwrap();
    let out = run(home.path(), &["status"]);
    assert!(stdout(&out).contains("Current campaign: (none)"));

    run(home.path(), &["campaign", "select", "camp-7"]);
    let out = run(home.path(), &["status"]);
    assert!(stdout(&out).contains("Current campaign: camp-7"));

    run(home.path(), &["campaign", "select"]);
    let out = run(home.path(), &["status"]);
    let text = stdout(&out);
    assert!(text.contains("Current campaign: (none)"), "{text}");
    assert!(text.contains("Previous campaign: camp-7"), "{text}");
}

#[test]
fn config_file_supplies_base_url() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("config.toml"),
        "[console]\nbase_url = \"http://from-config/\"\n",
    )
    .unwrap();

    let out = run(home.path(), &["config", "show"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("base_url = http://from-config"));
}

// ---------------------------------------------------------------------------
// campaign flow against a mock server
// ---------------------------------------------------------------------------

#[test]
fn create_then_turn_uses_adopted_campaign() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let create = server
        .mock("POST", "/api/campaign/create")
        .with_status(200)
        .with_body(r#"{"campaign_id":"camp-42"}"#)
        .create();
    let turn = server
        .mock("POST", "/api/chat/turn")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "campaign_id": "camp-42",
            "user_input": "open the door"
        })))
        .with_status(200)
        .with_body(r#"{"narrative_text":"The door creaks open."}"#)
        .create();
    let url = server.url();

    let out = run(home.path(), &["--base-url", &url, "campaign", "create"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stderr(&out).contains("Current campaign: camp-42"));

    let out = run(home.path(), &["turn", "input", "open the door"]);
    assert!(stderr(&out).contains("Applied user_input to raw."));

    let out = run(home.path(), &["--base-url", &url, "turn", "send"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("The door creaks open."));

    create.assert();
    turn.assert();

    let out = run(home.path(), &["history", "list"]);
    let listing = stdout(&out);
    assert!(listing.contains("[0] "), "{listing}");
    assert!(listing.contains("POST /api/chat/turn | 200"));
    assert!(listing.contains("[1] "));
}

#[test]
fn campaign_list_prints_options_and_marks_current() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/campaign/list")
        .with_status(200)
        .with_body(r#"{"items":[{"id":"a","title":"Alpha"},{"id":"b"}]}"#)
        .create();

    run(home.path(), &["campaign", "select", "b"]);
    let out = run(
        home.path(),
        &["--base-url", &server.url(), "campaign", "list"],
    );
    let text = stdout(&out);
    assert!(text.contains("  a\ta - Alpha"), "{text}");
    assert!(text.contains("* b\tb"), "{text}");

    let out = run(home.path(), &["campaign", "options"]);
    assert_eq!(stdout(&out), text);
}

// ---------------------------------------------------------------------------
// failures
// ---------------------------------------------------------------------------

#[test]
fn unreachable_host_is_recorded_not_fatal() {
    let home = TempDir::new().unwrap();
    let out = run(
        home.path(),
        &["--base-url", "http://127.0.0.1:1", "actor", "select"],
    );
    assert_eq!(out.status.code(), Some(0));
    assert!(stderr(&out).contains("-> FETCH_ERROR in "));

    let out = run(
        home.path(),
        &[
            "--base-url",
            "http://127.0.0.1:1",
            "--fail-on-error",
            "actor",
            "select",
        ],
    );
    assert_eq!(out.status.code(), Some(2));

    let out = run(home.path(), &["history", "show", "0", "--response"]);
    assert!(!stdout(&out).is_empty());
}

#[test]
fn apply_on_broken_buffer_reports_validation() {
    let home = TempDir::new().unwrap();
    run(home.path(), &["buffer", "set", "select-actor", "{ nope"]);

    let out = run(home.path(), &["--fail-on-error", "actor", "apply", "hero"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Apply failed: actor raw is not JSON."));

    let out = run(home.path(), &["buffer", "show", "select-actor"]);
    assert_eq!(stdout(&out).trim_end(), "{ nope");
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

#[test]
fn history_export_and_clear() {
    let home = TempDir::new().unwrap();
    let export_dir = TempDir::new().unwrap();
    run(
        home.path(),
        &["--base-url", "http://127.0.0.1:1", "campaign", "list"],
    );

    let out = run(
        home.path(),
        &[
            "history",
            "export",
            "--dir",
            export_dir.path().to_str().unwrap(),
        ],
    );
    assert!(out.status.success(), "{}", stderr(&out));
    let path = stdout(&out).trim().to_owned();
    let exported: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(exported[0]["endpoint"], "GET /api/campaign/list");
    assert_eq!(exported[0]["status"], "FETCH_ERROR");

    let out = run(home.path(), &["history", "clear"]);
    assert!(stderr(&out).contains("History cleared."));
    let out = run(home.path(), &["history", "list"]);
    assert_eq!(stdout(&out), "No requests yet.\n");
}

#[test]
fn history_show_out_of_range_exits_1() {
    let home = TempDir::new().unwrap();
    let out = run(home.path(), &["history", "show", "3"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("history entry 3 not found"));
}
