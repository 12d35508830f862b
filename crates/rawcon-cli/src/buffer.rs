//! Named JSON editor buffers and single-field patching.
//!
//! Buffers hold free-form text that is expected, but not required, to be a
//! JSON object. Every operation here leaves a buffer byte-identical unless it
//! actually changes a field.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::store::{self, KeyValueStore, StoreError};

/// Value a template uses to mean "fill in the current campaign".
pub const PLACEHOLDER: &str = "<current>";

/// The editor buffers the console keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum BufferName {
    /// Body for `POST /api/campaign/create`.
    #[value(name = "create")]
    CreateCampaign,
    /// Body for `POST /api/campaign/select_actor`.
    #[value(name = "select-actor")]
    SelectActor,
    /// Body for `POST /api/chat/turn`.
    #[value(name = "turn")]
    Turn,
    /// Patch object merged into the settings apply body.
    #[value(name = "settings-patch")]
    SettingsPatch,
}

impl BufferName {
    pub const ALL: [Self; 4] = [
        Self::CreateCampaign,
        Self::SelectActor,
        Self::Turn,
        Self::SettingsPatch,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateCampaign => "create",
            Self::SelectActor => "select-actor",
            Self::Turn => "turn",
            Self::SettingsPatch => "settings-patch",
        }
    }

    /// Short label used in status messages (`Apply failed: turn raw is not JSON.`).
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreateCampaign => "create",
            Self::SelectActor => "actor",
            Self::Turn => "turn",
            Self::SettingsPatch => "settings patch",
        }
    }

    /// Whether the template carries a `campaign_id` that follows the current campaign.
    pub const fn binds_campaign(self) -> bool {
        matches!(self, Self::SelectActor | Self::Turn)
    }

    pub const fn template(self) -> &'static str {
        match self {
            Self::CreateCampaign => concat!(
                "{\n",
                "  \"world_id\": \"\",\n",
                "  \"map_id\": \"\",\n",
                "  \"party_character_ids\": [],\n",
                "  \"active_actor_id\": \"\"\n",
                "}"
            ),
            Self::SelectActor => concat!(
                "{\n",
                "  \"campaign_id\": \"<current>\",\n",
                "  \"actor_id\": \"\"\n",
                "}"
            ),
            Self::Turn => concat!(
                "{\n",
                "  \"campaign_id\": \"<current>\",\n",
                "  \"user_input\": \"\",\n",
                "  \"actor_id\": \"\"\n",
                "}"
            ),
            Self::SettingsPatch => r#"{ "dialog.auto_type_enabled": false }"#,
        }
    }
}

impl std::fmt::Display for BufferName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a patch was refused. The buffer is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// The buffer text is not a JSON object.
    NotJsonObject,
    /// The buffer is an object but lacks the field.
    MissingField(String),
    /// The patched document could not be re-serialized.
    Encode(String),
}

impl std::fmt::Display for PatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotJsonObject => f.write_str("buffer is not a JSON object"),
            Self::MissingField(field) => write!(f, "buffer has no `{field}` field"),
            Self::Encode(msg) => write!(f, "could not encode buffer: {msg}"),
        }
    }
}

impl std::error::Error for PatchError {}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn write_object(text: &mut String, map: Map<String, Value>) -> Result<(), PatchError> {
    let encoded = serde_json::to_string_pretty(&Value::Object(map))
        .map_err(|e| PatchError::Encode(e.to_string()))?;
    *text = encoded;
    Ok(())
}

/// Replace an existing field and re-serialize the buffer with 2-space indentation.
///
/// # Errors
///
/// [`PatchError::NotJsonObject`] when the text does not parse as an object,
/// [`PatchError::MissingField`] when the field is absent. The text is left
/// untouched on error.
pub fn patch_field(text: &mut String, field: &str, value: Value) -> Result<(), PatchError> {
    let mut map = parse_object(text).ok_or(PatchError::NotJsonObject)?;
    let slot = map
        .get_mut(field)
        .ok_or_else(|| PatchError::MissingField(field.to_owned()))?;
    *slot = value;
    write_object(text, map)
}

/// Insert or replace a field, as the "apply to raw" actions do.
///
/// # Errors
///
/// [`PatchError::NotJsonObject`] when the text does not parse as an object.
pub fn apply_field(text: &mut String, field: &str, value: Value) -> Result<(), PatchError> {
    let mut map = parse_object(text).ok_or(PatchError::NotJsonObject)?;
    map.insert(field.to_owned(), value);
    write_object(text, map)
}

/// A `campaign_id` value still tracking the identity (as opposed to pinned by the user).
pub fn is_bound(value: &Value, previous: &str) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty() || s == PLACEHOLDER || s == previous,
        _ => false,
    }
}

/// Move a bound `campaign_id` from `previous` to `next`.
///
/// Returns whether the buffer text changed. Pinned values, buffers without
/// the field and non-JSON buffers are left byte-identical.
pub fn propagate_identity(text: &mut String, previous: &str, next: &str) -> bool {
    let Some(current) = parse_object(text).and_then(|map| map.get("campaign_id").cloned()) else {
        return false;
    };
    if !is_bound(&current, previous) {
        return false;
    }
    let before = text.clone();
    if patch_field(text, "campaign_id", Value::String(next.to_owned())).is_err() {
        return false;
    }
    *text != before
}

/// The buffer texts, each persisted under its own store key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffers {
    texts: BTreeMap<BufferName, String>,
}

impl Default for Buffers {
    fn default() -> Self {
        let texts = BufferName::ALL
            .into_iter()
            .map(|name| (name, name.template().to_owned()))
            .collect();
        Self { texts }
    }
}

impl Buffers {
    /// Load saved buffers; unsaved ones start from their template.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let texts = BufferName::ALL
            .into_iter()
            .map(|name| {
                let text = store
                    .get(&store::buffer_key(name.as_str()))
                    .unwrap_or_else(|| name.template().to_owned());
                (name, text)
            })
            .collect();
        Self { texts }
    }

    pub fn text(&self, name: BufferName) -> &str {
        self.texts.get(&name).map_or("", String::as_str)
    }

    pub fn text_mut(&mut self, name: BufferName) -> &mut String {
        self.texts.entry(name).or_default()
    }

    /// Replace a buffer's text and persist it.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the buffer could not be saved.
    pub fn set(
        &mut self,
        store: &dyn KeyValueStore,
        name: BufferName,
        text: String,
    ) -> Result<(), StoreError> {
        self.texts.insert(name, text);
        self.save(store, name)
    }

    /// Restore a buffer's template text and persist it.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the buffer could not be saved.
    pub fn reset(&mut self, store: &dyn KeyValueStore, name: BufferName) -> Result<(), StoreError> {
        self.set(store, name, name.template().to_owned())
    }

    /// Persist the current text of one buffer.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the buffer could not be saved.
    pub fn save(&self, store: &dyn KeyValueStore, name: BufferName) -> Result<(), StoreError> {
        store.set(&store::buffer_key(name.as_str()), self.text(name))
    }
}
