#![allow(clippy::unwrap_used, clippy::expect_used)]

use mockito::Matcher;
use serde_json::json;

use super::*;
use crate::history::Status;
use crate::remote::http::build_client;
use crate::store::{MemoryStore, SqliteStore};

fn console_at(base_url: &str) -> Console<MemoryStore> {
    Console::open(
        MemoryStore::new(),
        build_client().unwrap(),
        Some(base_url),
        &ConsoleConfig::default(),
    )
}

fn campaign_id_in(console: &Console<MemoryStore>, name: BufferName) -> Value {
    serde_json::from_str::<Value>(console.buffers().text(name)).unwrap()["campaign_id"].clone()
}

// --- open ---

#[test]
fn base_url_precedence_is_override_then_store_then_config() {
    let config = ConsoleConfig {
        base_url: Some("http://from-config".to_owned()),
        export_dir: None,
    };
    let client = build_client().unwrap();

    let store = MemoryStore::new();
    let console = Console::open(store, client.clone(), None, &config);
    assert_eq!(console.base_url(), Some("http://from-config"));

    let store = MemoryStore::new();
    store.set(store::BASE_URL_KEY, "http://saved/").unwrap();
    let console = Console::open(store, client.clone(), None, &config);
    assert_eq!(console.base_url(), Some("http://saved"));

    let store = MemoryStore::new();
    store.set(store::BASE_URL_KEY, "http://saved").unwrap();
    let console = Console::open(store, client, Some(" http://flag// "), &config);
    assert_eq!(console.base_url(), Some("http://flag"));
}

#[test]
fn save_and_clear_base_url() {
    let mut console = Console::open(
        MemoryStore::new(),
        build_client().unwrap(),
        None,
        &ConsoleConfig::default(),
    );
    let out = console.save_base_url(Some("http://h:8000/"));
    assert_eq!(out.messages, vec!["Saved Base URL: http://h:8000"]);
    assert_eq!(
        console.store().get(store::BASE_URL_KEY).as_deref(),
        Some("http://h:8000")
    );

    let out = console.save_base_url(Some("   "));
    assert_eq!(out.messages, vec!["Saved: Base URL cleared."]);
    assert!(console.store().get(store::BASE_URL_KEY).is_none());
    assert_eq!(console.base_url(), None);
}

// --- campaigns ---

#[test]
fn refresh_campaigns_normalizes_wrapped_list() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/campaign/list")
        .with_status(200)
        .with_body(r#"{"campaigns":[{"campaign_id":"c1","name":"One"},"c2",{"nope":1}]}"#)
        .create();

    let mut console = console_at(&server.url());
    let out = console.refresh_campaigns();

    mock.assert();
    assert!(out.value.ok);
    assert_eq!(out.failure, None);
    assert!(out.messages[0].starts_with("GET /api/campaign/list -> 200 in "));
    assert_eq!(out.messages[1], "Loaded 2 campaign(s).");
    let labels: Vec<&str> = console
        .tracker()
        .options()
        .iter()
        .map(|o| o.label.as_str())
        .collect();
    assert_eq!(labels, vec!["c1 - One", "c2"]);
    assert_eq!(console.ledger().len(), 1);
}

#[test]
fn refresh_campaigns_with_non_json_keeps_options() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/campaign/list")
        .with_status(502)
        .with_body("<html>bad gateway</html>")
        .create();

    let mut console = console_at(&server.url());
    console.select_campaign("kept");
    let out = console.refresh_campaigns();

    assert_eq!(out.failure, Some(FailureKind::Http));
    assert_eq!(console.tracker().options(), &[campaign::CampaignOption::manual("kept")]);
    assert_eq!(console.ledger().get(0).unwrap().response_raw, "<html>bad gateway</html>");
}

#[test]
fn refresh_campaigns_with_empty_payload_keeps_options() {
    for body in ["null", "false", "0", "\"\""] {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/campaign/list")
            .with_status(200)
            .with_body(body)
            .create();

        let mut console = console_at(&server.url());
        console.select_campaign("a");
        console.tracker.replace_options(vec![campaign::CampaignOption {
            id: "b".to_owned(),
            label: "b - Bee".to_owned(),
        }]);
        let out = console.refresh_campaigns();

        assert_eq!(out.failure, Some(FailureKind::Decode), "{body}");
        assert_eq!(console.tracker().options().len(), 2, "{body}");
        assert_eq!(console.tracker().options()[0].label, "b - Bee", "{body}");
    }
}

#[test]
fn create_campaign_adopts_extracted_id_and_propagates() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/campaign/create")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Exact(BufferName::CreateCampaign.template().to_owned()))
        .with_status(200)
        .with_body(r#"{"campaign":{"campaign_id":"C"}}"#)
        .create();

    let mut console = console_at(&server.url());
    let out = console.create_campaign();

    mock.assert();
    let transition = out.value.expect("adopted id");
    assert_eq!(transition.next, "C");
    assert_eq!(
        transition.updated,
        vec![BufferName::SelectActor, BufferName::Turn]
    );
    assert_eq!(console.tracker().current(), "C");
    assert_eq!(campaign_id_in(&console, BufferName::Turn), json!("C"));
    assert_eq!(campaign_id_in(&console, BufferName::SelectActor), json!("C"));
    assert!(out.messages.contains(&"Current campaign: C".to_owned()));
    assert!(out.messages.contains(&"Updated campaign_id in turn buffer.".to_owned()));

    // Identity and buffers survive a reload.
    let store = console.store();
    assert_eq!(CampaignTracker::load(store).current(), "C");
    assert_eq!(
        Buffers::load(store).text(BufferName::Turn),
        console.buffers().text(BufferName::Turn)
    );
}

#[test]
fn create_campaign_without_id_keeps_identity() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/api/campaign/create")
        .with_status(500)
        .with_body("boom")
        .create();

    let mut console = console_at(&server.url());
    console.select_campaign("before");
    let out = console.create_campaign();

    assert!(out.value.is_none());
    assert_eq!(out.failure, Some(FailureKind::Http));
    assert_eq!(console.tracker().current(), "before");
}

#[test]
fn select_campaign_leaves_pinned_buffer_alone() {
    let mut console = console_at("http://unused");
    console.select_campaign("c1");
    let pinned = "{\"campaign_id\": \"mine\", \"actor_id\": \"\"}".to_owned();
    console.set_buffer(BufferName::SelectActor, pinned.clone());

    let out = console.select_campaign("c2");
    assert_eq!(out.value.updated, vec![BufferName::Turn]);
    assert_eq!(console.buffers().text(BufferName::SelectActor), pinned);
    assert_eq!(campaign_id_in(&console, BufferName::Turn), json!("c2"));

    let out = console.select_campaign("");
    assert_eq!(out.messages[0], "Current campaign cleared.");
    assert_eq!(console.tracker().last(), "c2");
}

// --- actor / turn ---

#[test]
fn send_turn_projects_response() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/chat/turn")
        .match_body(Matcher::Json(json!({
            "campaign_id": "c1",
            "user_input": "look around",
            "actor_id": ""
        })))
        .with_status(200)
        .with_body(r#"{"narrative_text":"Hello","tool_calls":[{"name":"roll"}]}"#)
        .create();

    let mut console = console_at(&server.url());
    console.select_campaign("c1");
    console.apply_user_input("look around");
    let out = console.send_turn();

    mock.assert();
    assert_eq!(out.failure, None);
    assert_eq!(out.value.get("narrative_text"), "Hello");
    assert_eq!(out.value.get("dialog_type"), "");
    assert!(out.value.get("tool_calls").contains("\"roll\""));
}

#[test]
fn send_turn_with_non_json_response_blanks_slots() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/api/chat/turn")
        .with_status(200)
        .with_body("not json")
        .create();

    let mut console = console_at(&server.url());
    let out = console.send_turn();

    assert_eq!(out.failure, Some(FailureKind::Decode));
    assert_eq!(out.value.raw(), "not json");
    assert!(out.value.slots().all(|(_, value)| value.is_empty()));
}

#[test]
fn apply_on_non_json_buffer_is_validation_failure() {
    let mut console = console_at("http://unused");
    console.set_buffer(BufferName::Turn, "{ broken".to_owned());

    let out = console.apply_user_input("hi");
    assert_eq!(out.failure, Some(FailureKind::Validation));
    assert_eq!(out.messages, vec!["Apply failed: turn raw is not JSON."]);
    assert_eq!(console.buffers().text(BufferName::Turn), "{ broken");
}

#[test]
fn apply_failure_names_the_actual_error() {
    assert_eq!(
        apply_failure_message(BufferName::SelectActor, &PatchError::NotJsonObject),
        "Apply failed: actor raw is not JSON."
    );
    assert_eq!(
        apply_failure_message(BufferName::Turn, &PatchError::Encode("bad float".to_owned())),
        "Apply failed: could not encode buffer: bad float."
    );
}

#[test]
fn apply_actor_sets_field() {
    let mut console = console_at("http://unused");
    let out = console.apply_actor("hero");
    assert_eq!(out.messages, vec!["Applied actor_id to raw."]);
    let text = console.buffers().text(BufferName::SelectActor);
    assert_eq!(
        serde_json::from_str::<Value>(text).unwrap()["actor_id"],
        json!("hero")
    );
}

#[test]
fn unreachable_host_records_fetch_error() {
    let mut console = console_at("http://127.0.0.1:1");
    let out = console.select_actor();

    assert!(!out.value.ok);
    assert_eq!(out.value.status, Status::FetchError);
    assert_eq!(out.failure, Some(FailureKind::Transport));
    assert!(out.messages[0].contains("-> FETCH_ERROR in "));

    let entry = console.ledger().get(0).unwrap();
    assert_eq!(entry.status, Status::FetchError);
    assert_eq!(entry.url, "http://127.0.0.1:1/api/campaign/select_actor");
    assert!(!entry.response_raw.is_empty());
    assert_eq!(entry.request_raw, BufferName::SelectActor.template());
}

#[test]
fn relative_url_without_base_is_fetch_error() {
    let mut console = Console::open(
        MemoryStore::new(),
        build_client().unwrap(),
        None,
        &ConsoleConfig::default(),
    );
    let out = console.refresh_campaigns();
    assert_eq!(out.value.status, Status::FetchError);
    assert_eq!(console.ledger().get(0).unwrap().url, "/api/campaign/list");
}

#[test]
fn overlapping_consoles_on_one_database_keep_every_entry() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("console.db");
    let open = || {
        Console::open(
            SqliteStore::open(&path).unwrap(),
            build_client().unwrap(),
            Some("http://127.0.0.1:1"),
            &ConsoleConfig::default(),
        )
    };
    let mut first = open();
    let mut second = open();

    first.select_actor();
    second.send_turn();

    let stored = Ledger::load(&SqliteStore::open(&path).unwrap());
    let endpoints: Vec<&str> = stored.entries().iter().map(|e| e.endpoint.as_str()).collect();
    assert_eq!(
        endpoints,
        vec!["POST /api/chat/turn", "POST /api/campaign/select_actor"]
    );
    assert_eq!(second.ledger(), &stored);
    assert_eq!(first.ledger().len(), 1);
}

#[test]
fn unsaved_history_is_reported_after_status_line() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/api/campaign/select_actor")
        .with_status(200)
        .with_body("{}")
        .create();

    let mut console = console_at(&server.url());
    console.store().set_read_only(true);
    let out = console.select_actor();

    assert!(out.value.ok);
    assert_eq!(out.messages.len(), 2);
    assert_eq!(out.messages[1], HISTORY_NOT_SAVED);
    assert_eq!(console.ledger().len(), 1);
}

// --- settings ---

#[test]
fn load_schema_encodes_campaign_id() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/settings/schema")
        .match_query(Matcher::UrlEncoded("campaign_id".into(), "c 1&x".into()))
        .with_status(200)
        .with_body(r#"{"definitions":[{"key":"dialog.auto_type_enabled"}],"snapshot":{}}"#)
        .create();

    let mut console = console_at(&server.url());
    console.select_campaign("c 1&x");
    let out = console.load_schema();

    mock.assert();
    assert!(out.value.get("definitions").contains("dialog.auto_type_enabled"));
    assert_eq!(out.value.get("snapshot"), "{}");
}

#[test]
fn apply_settings_sends_patch_body() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/settings/apply")
        .match_body(Matcher::Json(json!({
            "campaign_id": "c1",
            "patch": { "dialog.auto_type_enabled": false }
        })))
        .with_status(200)
        .with_body(r#"{"snapshot":{"a":1},"change_summary":"1 change"}"#)
        .create();

    let mut console = console_at(&server.url());
    console.select_campaign("c1");
    let out = console.apply_settings();

    mock.assert();
    assert_eq!(out.value.get("change_summary"), "1 change");
}

#[test]
fn settings_body_for_empty_patch() {
    assert_eq!(
        settings_apply_body("c1", "  \n"),
        r#"{"campaign_id":"c1","patch":{}}"#
    );
}

#[test]
fn settings_body_for_valid_patch_is_pretty() {
    assert_eq!(
        settings_apply_body("c1", r#"{"a": 1}"#),
        "{\n  \"campaign_id\": \"c1\",\n  \"patch\": {\n    \"a\": 1\n  }\n}"
    );
}

#[test]
fn settings_body_splices_malformed_patch_verbatim() {
    assert_eq!(
        settings_apply_body("c\"1", "{ a: 1"),
        r#"{"campaign_id":"c\"1","patch":{ a: 1}"#
    );
    assert_eq!(
        settings_apply_body("c1", "null"),
        r#"{"campaign_id":"c1","patch":null}"#
    );
}

// --- buffers ---

#[test]
fn patch_buffer_parses_json_values() {
    let mut console = console_at("http://unused");
    let out = console.patch_buffer(BufferName::CreateCampaign, "party_character_ids", "[\"a\"]");
    assert_eq!(out.failure, None);
    let text = console.buffers().text(BufferName::CreateCampaign);
    assert_eq!(
        serde_json::from_str::<Value>(text).unwrap()["party_character_ids"],
        json!(["a"])
    );

    console.patch_buffer(BufferName::CreateCampaign, "world_id", "w-1");
    let text = console.buffers().text(BufferName::CreateCampaign);
    assert_eq!(
        serde_json::from_str::<Value>(text).unwrap()["world_id"],
        json!("w-1")
    );
}

#[test]
fn patch_buffer_missing_field_is_refused() {
    let mut console = console_at("http://unused");
    let before = console.buffers().text(BufferName::Turn).to_owned();
    let out = console.patch_buffer(BufferName::Turn, "nope", "1");
    assert_eq!(out.failure, Some(FailureKind::Validation));
    assert_eq!(out.messages, vec!["Patch failed: buffer has no `nope` field."]);
    assert_eq!(console.buffers().text(BufferName::Turn), before);
}

#[test]
fn reset_buffer_restores_template() {
    let mut console = console_at("http://unused");
    console.set_buffer(BufferName::Turn, "x".to_owned());
    console.reset_buffer(BufferName::Turn);
    assert_eq!(
        console.buffers().text(BufferName::Turn),
        BufferName::Turn.template()
    );
}

// --- history ---

#[test]
fn clear_and_export_history() {
    let mut console = console_at("http://127.0.0.1:1");
    console.select_actor();
    console.send_turn();

    let dir = tempfile::TempDir::new().unwrap();
    let path = console.export_history(&dir.path().join("out")).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("raw-console-history-"), "{name}");
    let exported: Vec<history::HistoryEntry> =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(exported.as_slice(), console.ledger().entries());
    assert_eq!(exported[0].endpoint, "POST /api/chat/turn");

    let out = console.clear_history();
    assert_eq!(out.messages, vec!["History cleared."]);
    assert!(console.ledger().is_empty());
}

#[test]
fn clear_history_reports_unsaved_clear() {
    let mut console = console_at("http://127.0.0.1:1");
    console.select_actor();
    console.store().set_read_only(true);

    let out = console.clear_history();
    assert_eq!(out.messages, vec![HISTORY_NOT_SAVED]);
    assert!(console.ledger().is_empty());
    console.store().set_read_only(false);
    assert_eq!(Ledger::load(console.store()).len(), 1);
}

#[test]
fn status_view_reflects_state() {
    let mut console = console_at("http://h");
    console.select_campaign("a");
    console.select_campaign("b");
    let status = console.status();
    assert_eq!(status.current_campaign, "b");
    assert_eq!(status.last_campaign, "a");
    assert_eq!(status.base_url.as_deref(), Some("http://h"));
    assert_eq!(status.known_campaigns, 2);
    assert_eq!(status.history_len, 0);
}
