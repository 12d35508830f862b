use serde_json::Value;

use crate::format::{format_field, parse_json};
use crate::history::FailureKind;

/// A display slot bound to one top-level response field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub field: &'static str,
    pub label: &'static str,
}

const fn slot(field: &'static str, label: &'static str) -> Slot {
    Slot { field, label }
}

/// Slots rendered for `POST /api/chat/turn`.
pub const TURN_SLOTS: &[Slot] = &[
    slot("narrative_text", "Narrative"),
    slot("dialog_type", "Dialog Type"),
    slot("tool_calls", "Tool Calls"),
    slot("applied_actions", "Applied Actions"),
    slot("tool_feedback", "Tool Feedback"),
    slot("conflict_report", "Conflict Report"),
    slot("state_summary", "State Summary"),
];

/// Slots rendered for `GET /api/settings/schema`.
pub const SCHEMA_SLOTS: &[Slot] = &[
    slot("definitions", "Definitions"),
    slot("snapshot", "Snapshot"),
];

/// Slots rendered for `POST /api/settings/apply`.
pub const APPLY_SLOTS: &[Slot] = &[
    slot("snapshot", "Snapshot"),
    slot("change_summary", "Change Summary"),
];

/// Raw response text plus the derived per-slot renderings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    raw: String,
    decoded: bool,
    values: Vec<(Slot, String)>,
}

impl Projection {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether the raw text decoded as a JSON object.
    pub const fn is_decoded(&self) -> bool {
        self.decoded
    }

    /// `Some(Decode)` when the derived slots were blanked.
    pub const fn failure(&self) -> Option<FailureKind> {
        if self.decoded {
            None
        } else {
            Some(FailureKind::Decode)
        }
    }

    /// Rendered value for `field`; empty for unknown fields.
    pub fn get(&self, field: &str) -> &str {
        self.values
            .iter()
            .find(|(slot, _)| slot.field == field)
            .map_or("", |(_, value)| value.as_str())
    }

    pub fn slots(&self) -> impl Iterator<Item = (&Slot, &str)> {
        self.values.iter().map(|(slot, value)| (slot, value.as_str()))
    }
}

/// Map `raw` onto `slots`.
///
/// A body that is not a JSON object blanks every slot; the raw text is always
/// kept. Each slot is filled independently, so a missing field renders empty
/// without affecting its neighbours.
pub fn project(raw: &str, slots: &[Slot]) -> Projection {
    let data = parse_json(raw).filter(Value::is_object);
    let values = slots
        .iter()
        .map(|slot| {
            let value = data
                .as_ref()
                .map(|d| format_field(d.get(slot.field)))
                .unwrap_or_default();
            (*slot, value)
        })
        .collect();
    Projection {
        raw: raw.to_owned(),
        decoded: data.is_some(),
        values,
    }
}
