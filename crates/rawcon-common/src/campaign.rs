//! Campaign identifier probing for the heterogeneous response shapes the
//! campaign endpoints return.
//!
//! Every lookup is an ordered list of rules evaluated first-match-wins, so the
//! precedence is data rather than branching and can be tested rule by rule.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::scalar_text;

/// One place a campaign identifier may live in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRule {
    /// The payload itself is a bare string or number.
    Scalar,
    /// A top-level field.
    Field(&'static str),
    /// A field of a top-level object field.
    Nested(&'static str, &'static str),
}

impl IdRule {
    pub fn apply(self, data: &Value) -> Option<String> {
        match self {
            Self::Scalar => match data {
                Value::String(_) | Value::Number(_) => scalar_text(data),
                _ => None,
            },
            Self::Field(name) => data.get(name).and_then(scalar_text),
            Self::Nested(outer, inner) => data
                .get(outer)
                .and_then(|o| o.get(inner))
                .and_then(scalar_text),
        }
    }
}

/// Identifier precedence for campaign-creation responses.
pub const ID_RULES: &[IdRule] = &[
    IdRule::Scalar,
    IdRule::Field("campaign_id"),
    IdRule::Field("id"),
    IdRule::Nested("campaign", "campaign_id"),
    IdRule::Nested("data", "campaign_id"),
];

/// Wrapper keys that may hold the campaign list, in lookup order.
pub const LIST_KEYS: &[&str] = &["campaigns", "items", "data"];

/// Fields checked for a list item's identifier, in lookup order.
pub const OPTION_ID_KEYS: &[&str] = &["campaign_id", "id", "uuid", "key", "value"];

/// Fields checked for a list item's display name, in lookup order.
pub const OPTION_LABEL_KEYS: &[&str] = &["name", "title"];

/// Extract a campaign identifier from a decoded response, or `""` when no
/// rule matches.
pub fn extract_campaign_id(data: &Value) -> String {
    ID_RULES
        .iter()
        .find_map(|rule| rule.apply(data))
        .unwrap_or_default()
}

/// An entry in the known-campaigns list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignOption {
    pub id: String,
    pub label: String,
}

impl CampaignOption {
    /// Option synthesized for an id that is current but not in the server list.
    pub fn manual(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            label: format!("Manual: {id}"),
        }
    }
}

/// Locate the campaign array in a list response: either the payload itself or
/// the first array found under [`LIST_KEYS`].
pub fn campaign_items(data: &Value) -> &[Value] {
    if let Value::Array(items) = data {
        return items;
    }
    LIST_KEYS
        .iter()
        .find_map(|key| data.get(key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Normalize one list item to an option. Items without a usable id yield `None`.
pub fn option_from_item(item: &Value) -> Option<CampaignOption> {
    match item {
        Value::String(_) | Value::Number(_) => {
            let id = scalar_text(item)?;
            Some(CampaignOption {
                label: id.clone(),
                id,
            })
        }
        Value::Object(_) => {
            let id = OPTION_ID_KEYS
                .iter()
                .find_map(|key| item.get(key).and_then(scalar_text))?;
            let name = OPTION_LABEL_KEYS
                .iter()
                .find_map(|key| item.get(key).and_then(scalar_text));
            let label = name.map_or_else(|| id.clone(), |name| format!("{id} - {name}"));
            Some(CampaignOption { id, label })
        }
        _ => None,
    }
}

/// Normalize a whole list response.
pub fn normalize_campaign_list(data: &Value) -> Vec<CampaignOption> {
    campaign_items(data)
        .iter()
        .filter_map(option_from_item)
        .collect()
}
