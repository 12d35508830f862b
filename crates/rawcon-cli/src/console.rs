//! Console state and one handler per console action.
//!
//! Each handler runs at most one HTTP exchange, applies the resulting state
//! change (identity, buffers, ledger) and persists it, and reports what
//! happened as status messages instead of errors.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use reqwest::Method;
use serde_json::{Value, json};

use rawcon_common::format::{is_truthy, parse_json};
use rawcon_common::projection::{self, APPLY_SLOTS, Projection, SCHEMA_SLOTS, TURN_SLOTS};

use crate::buffer::{self, BufferName, Buffers, PatchError};
use crate::campaign::{self, CampaignTracker, Transition};
use crate::config::{ConsoleConfig, normalize_base_url};
use crate::history::{self, FailureKind, Ledger};
use crate::remote::dispatch::HISTORY_NOT_SAVED;
use crate::remote::{self, Dispatcher, SendResult};
use crate::store::{self, KeyValueStore, StoreError};

/// What a handler did, for the caller to print.
#[derive(Debug)]
pub struct Outcome<T = ()> {
    /// Status lines in the order they were produced.
    pub messages: Vec<String>,
    /// Set when the action did not fully succeed.
    pub failure: Option<FailureKind>,
    pub value: T,
}

impl<T> Outcome<T> {
    fn new(value: T) -> Self {
        Self {
            messages: Vec::new(),
            failure: None,
            value,
        }
    }

    fn say(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Record a failed write without aborting the action.
    fn note_store(&mut self, result: Result<(), StoreError>, what: &str) {
        if let Err(e) = result {
            tracing::warn!("{what} could not be saved: {e}");
            self.say(format!("{what} could not be saved."));
        }
    }
}

/// Snapshot for `rawcon status`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StatusView {
    pub current_campaign: String,
    pub last_campaign: String,
    pub base_url: Option<String>,
    pub history_len: usize,
    pub known_campaigns: usize,
}

pub struct Console<S: KeyValueStore> {
    store: S,
    dispatcher: Dispatcher,
    ledger: Ledger,
    tracker: CampaignTracker,
    buffers: Buffers,
}

impl<S: KeyValueStore> Console<S> {
    /// Load console state from `store`.
    ///
    /// Base URL precedence: `base_url_override` → saved value → `config`.
    pub fn open(
        store: S,
        client: reqwest::blocking::Client,
        base_url_override: Option<&str>,
        config: &ConsoleConfig,
    ) -> Self {
        let base_url = base_url_override
            .and_then(normalize_base_url)
            .or_else(|| {
                store
                    .get(store::BASE_URL_KEY)
                    .and_then(|u| normalize_base_url(&u))
            })
            .or_else(|| config.base_url.clone());

        let ledger = Ledger::load(&store);
        let buffers = Buffers::load(&store);
        let mut tracker = CampaignTracker::load(&store);
        for name in BufferName::ALL {
            if name.binds_campaign() {
                tracker.register(name);
            }
        }

        Self {
            store,
            dispatcher: Dispatcher::new(client, base_url),
            ledger,
            tracker,
            buffers,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub const fn tracker(&self) -> &CampaignTracker {
        &self.tracker
    }

    pub const fn buffers(&self) -> &Buffers {
        &self.buffers
    }

    pub fn base_url(&self) -> Option<&str> {
        self.dispatcher.base_url()
    }

    pub fn status(&self) -> StatusView {
        StatusView {
            current_campaign: self.tracker.current().to_owned(),
            last_campaign: self.tracker.last().to_owned(),
            base_url: self.base_url().map(ToOwned::to_owned),
            history_len: self.ledger.len(),
            known_campaigns: self.tracker.options().len(),
        }
    }

    // --- settings ---

    /// Save (or with `None`/blank, clear) the base URL override.
    pub fn save_base_url(&mut self, raw: Option<&str>) -> Outcome {
        let mut out = Outcome::new(());
        let base_url = raw.and_then(normalize_base_url);
        match &base_url {
            Some(url) => {
                let result = self.store.set(store::BASE_URL_KEY, url);
                if result.is_ok() {
                    out.say(format!("Saved Base URL: {url}"));
                }
                out.note_store(result, "Base URL");
            }
            None => {
                let result = self.store.remove(store::BASE_URL_KEY);
                if result.is_ok() {
                    out.say("Saved: Base URL cleared.");
                }
                out.note_store(result, "Base URL");
            }
        }
        self.dispatcher.set_base_url(base_url);
        out
    }

    // --- campaign identity ---

    /// Make `campaign_id` current (empty resets to no campaign).
    pub fn select_campaign(&mut self, campaign_id: &str) -> Outcome<Transition> {
        let transition = self.tracker.set_current(campaign_id, &mut self.buffers);
        let mut out = Outcome::new(transition);
        if campaign_id.is_empty() {
            out.say("Current campaign cleared.");
        } else {
            out.say(format!("Current campaign: {campaign_id}"));
        }
        self.persist_transition(&mut out);
        out
    }

    fn persist_transition(&self, out: &mut Outcome<Transition>) {
        out.note_store(self.tracker.save(&self.store), "Campaign selection");
        for name in out.value.updated.clone() {
            out.say(format!("Updated campaign_id in {name} buffer."));
            out.note_store(self.buffers.save(&self.store, name), "Buffer");
        }
    }

    /// `GET /api/campaign/list`, replacing the known options when the
    /// response decodes.
    pub fn refresh_campaigns(&mut self) -> Outcome<SendResult> {
        let mut out = self.dispatch(&Method::GET, "/api/campaign/list", None);
        let Some(data) = parse_json(&out.value.response_text).filter(is_truthy) else {
            out.failure = out.failure.or(Some(FailureKind::Decode));
            return out;
        };
        self.tracker
            .replace_options(campaign::normalize_campaign_list(&data));
        out.say(format!(
            "Loaded {} campaign(s).",
            self.tracker.options().len()
        ));
        out.note_store(self.tracker.save(&self.store), "Campaign list");
        out
    }

    /// `POST /api/campaign/create` with the create buffer; adopts the
    /// identifier found in the response, if any.
    pub fn create_campaign(&mut self) -> Outcome<Option<Transition>> {
        let body = self.buffers.text(BufferName::CreateCampaign).to_owned();
        let sent = self.dispatch(&Method::POST, "/api/campaign/create", Some(&body));
        let mut out = Outcome {
            messages: sent.messages,
            failure: sent.failure,
            value: None,
        };

        let data = parse_json(&sent.value.response_text);
        if data.is_none() {
            out.failure = out.failure.or(Some(FailureKind::Decode));
        }
        let campaign_id = data
            .as_ref()
            .map(campaign::extract_from_response)
            .unwrap_or_default();
        if campaign_id.is_empty() {
            return out;
        }

        let selected = self.select_campaign(&campaign_id);
        out.messages.extend(selected.messages);
        out.value = Some(selected.value);
        out
    }

    // --- actor / turn ---

    /// Set `actor_id` in the select-actor buffer.
    pub fn apply_actor(&mut self, actor_id: &str) -> Outcome {
        self.apply_to_raw(BufferName::SelectActor, "actor_id", actor_id)
    }

    /// Set `user_input` in the turn buffer.
    pub fn apply_user_input(&mut self, user_input: &str) -> Outcome {
        self.apply_to_raw(BufferName::Turn, "user_input", user_input)
    }

    fn apply_to_raw(&mut self, name: BufferName, field: &str, value: &str) -> Outcome {
        let mut out = Outcome::new(());
        let text = self.buffers.text_mut(name);
        match buffer::apply_field(text, field, Value::String(value.to_owned())) {
            Ok(()) => {
                out.say(format!("Applied {field} to raw."));
                out.note_store(self.buffers.save(&self.store, name), "Buffer");
            }
            Err(e) => {
                out.say(apply_failure_message(name, &e));
                out.failure = Some(FailureKind::Validation);
            }
        }
        out
    }

    /// `POST /api/campaign/select_actor` with the select-actor buffer.
    pub fn select_actor(&mut self) -> Outcome<SendResult> {
        let body = self.buffers.text(BufferName::SelectActor).to_owned();
        self.dispatch(&Method::POST, "/api/campaign/select_actor", Some(&body))
    }

    /// `POST /api/chat/turn` with the turn buffer, projected onto the turn slots.
    pub fn send_turn(&mut self) -> Outcome<Projection> {
        let body = self.buffers.text(BufferName::Turn).to_owned();
        let sent = self.dispatch(&Method::POST, "/api/chat/turn", Some(&body));
        project_outcome(sent, TURN_SLOTS)
    }

    // --- settings ---

    /// `GET /api/settings/schema` for the current campaign.
    pub fn load_schema(&mut self) -> Outcome<Projection> {
        let path = remote::settings_schema_path(self.tracker.current());
        let sent = self.dispatch(&Method::GET, &path, None);
        project_outcome(sent, SCHEMA_SLOTS)
    }

    /// `POST /api/settings/apply` for the current campaign and the settings
    /// patch buffer.
    pub fn apply_settings(&mut self) -> Outcome<Projection> {
        let body = settings_apply_body(
            self.tracker.current(),
            self.buffers.text(BufferName::SettingsPatch),
        );
        let sent = self.dispatch(&Method::POST, "/api/settings/apply", Some(&body));
        project_outcome(sent, APPLY_SLOTS)
    }

    // --- buffers ---

    /// Replace a buffer's text verbatim.
    pub fn set_buffer(&mut self, name: BufferName, text: String) -> Outcome {
        let mut out = Outcome::new(());
        let result = self.buffers.set(&self.store, name, text);
        if result.is_ok() {
            out.say(format!("Saved {name} buffer."));
        }
        out.note_store(result, "Buffer");
        out
    }

    pub fn reset_buffer(&mut self, name: BufferName) -> Outcome {
        let mut out = Outcome::new(());
        let result = self.buffers.reset(&self.store, name);
        if result.is_ok() {
            out.say(format!("Reset {name} buffer to its template."));
        }
        out.note_store(result, "Buffer");
        out
    }

    /// Replace an existing field of a buffer; `value` is parsed as JSON when
    /// possible and used as a string otherwise.
    pub fn patch_buffer(&mut self, name: BufferName, field: &str, value: &str) -> Outcome {
        let mut out = Outcome::new(());
        let value = parse_json(value).unwrap_or_else(|| Value::String(value.to_owned()));
        match buffer::patch_field(self.buffers.text_mut(name), field, value) {
            Ok(()) => {
                out.say(format!("Patched {field} in {name} buffer."));
                out.note_store(self.buffers.save(&self.store, name), "Buffer");
            }
            Err(e) => {
                out.say(format!("Patch failed: {e}."));
                out.failure = Some(FailureKind::Validation);
            }
        }
        out
    }

    // --- history ---

    pub fn clear_history(&mut self) -> Outcome {
        let mut out = Outcome::new(());
        let result = self.ledger.clear(&self.store);
        if result.is_ok() {
            out.say("History cleared.");
        }
        out.note_store(result, "History");
        out
    }

    /// Write the exported ledger into `dir` under a timestamped name.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub fn export_history(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let bytes = self.ledger.export().context("serialize history")?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create export dir {}", dir.display()))?;
        let path = dir.join(history::export_file_name(chrono::Utc::now()));
        std::fs::write(&path, bytes)
            .with_context(|| format!("write history export {}", path.display()))?;
        Ok(path)
    }

    // --- dispatch ---

    fn dispatch(&mut self, method: &Method, path: &str, body: Option<&str>) -> Outcome<SendResult> {
        let sent = self
            .dispatcher
            .send(&mut self.ledger, &self.store, method, path, body);
        let mut out = Outcome::new(sent);
        out.failure = out.value.status.failure();
        out.say(out.value.status_line.clone());
        if out.value.persist_error.is_some() {
            out.say(HISTORY_NOT_SAVED);
        }
        out
    }
}

fn apply_failure_message(name: BufferName, error: &PatchError) -> String {
    match error {
        PatchError::NotJsonObject => format!("Apply failed: {} raw is not JSON.", name.label()),
        other => format!("Apply failed: {other}."),
    }
}

fn project_outcome(sent: Outcome<SendResult>, slots: &[projection::Slot]) -> Outcome<Projection> {
    let projection = projection::project(&sent.value.response_text, slots);
    Outcome {
        failure: sent.failure.or_else(|| projection.failure()),
        messages: sent.messages,
        value: projection,
    }
}

/// Body for `POST /api/settings/apply`.
///
/// An empty patch becomes `{}`; a patch that parses is embedded and the body
/// pretty-printed; anything else is spliced in verbatim so the server sees the
/// malformed text.
pub fn settings_apply_body(campaign_id: &str, patch_raw: &str) -> String {
    let id_json = Value::String(campaign_id.to_owned()).to_string();
    if patch_raw.trim().is_empty() {
        return format!(r#"{{"campaign_id":{id_json},"patch":{{}}}}"#);
    }
    if let Some(patch) = parse_json(patch_raw.trim()).filter(|p| !p.is_null())
        && let Ok(body) =
            serde_json::to_string_pretty(&json!({ "campaign_id": campaign_id, "patch": patch }))
    {
        return body;
    }
    format!(r#"{{"campaign_id":{id_json},"patch":{patch_raw}}}"#)
}

#[cfg(test)]
mod tests;
