use serde::{Deserialize, Serialize};

pub use rawcon_common::campaign::{
    CampaignOption, extract_campaign_id as extract_from_response, normalize_campaign_list,
};

use crate::buffer::{self, BufferName, Buffers};
use crate::store::{self, KeyValueStore, StoreError};

/// Persisted current/previous campaign identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignIdentity {
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub last: String,
}

/// The two tracker states. Transitions are always driven by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityState<'a> {
    Unset,
    Bound(&'a str),
}

/// Result of [`CampaignTracker::set_current`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub previous: String,
    pub next: String,
    /// Registered buffers whose text changed.
    pub updated: Vec<BufferName>,
}

/// Holds the current campaign and keeps registered buffers in step with it.
#[derive(Debug, Clone, Default)]
pub struct CampaignTracker {
    identity: CampaignIdentity,
    options: Vec<CampaignOption>,
    registered: Vec<BufferName>,
}

impl CampaignTracker {
    /// Load identity and known options; missing or corrupt values start empty.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            identity: store::get_json(store, store::CAMPAIGN_KEY).unwrap_or_default(),
            options: store::get_json(store, store::CAMPAIGN_OPTIONS_KEY).unwrap_or_default(),
            registered: Vec::new(),
        }
    }

    /// Declare that `name` carries a `campaign_id` following the identity.
    pub fn register(&mut self, name: BufferName) {
        if !self.registered.contains(&name) {
            self.registered.push(name);
        }
    }

    pub fn current(&self) -> &str {
        &self.identity.current
    }

    pub fn last(&self) -> &str {
        &self.identity.last
    }

    pub fn state(&self) -> IdentityState<'_> {
        if self.identity.current.is_empty() {
            IdentityState::Unset
        } else {
            IdentityState::Bound(&self.identity.current)
        }
    }

    pub fn options(&self) -> &[CampaignOption] {
        &self.options
    }

    /// Make `new_id` (possibly empty) current and propagate it into every
    /// registered buffer whose `campaign_id` is still bound.
    pub fn set_current(&mut self, new_id: &str, buffers: &mut Buffers) -> Transition {
        self.identity.last = std::mem::replace(&mut self.identity.current, new_id.to_owned());
        self.ensure_option(new_id);

        let previous = self.identity.last.clone();
        let next = self.identity.current.clone();
        let updated = self
            .registered
            .iter()
            .copied()
            .filter(|name| buffer::propagate_identity(buffers.text_mut(*name), &previous, &next))
            .collect();
        tracing::debug!(%previous, %next, ?updated, "campaign identity changed");
        Transition {
            previous,
            next,
            updated,
        }
    }

    /// Replace the known options with a fresh server list, keeping the current
    /// id selectable.
    pub fn replace_options(&mut self, options: Vec<CampaignOption>) {
        self.options = options;
        let current = self.identity.current.clone();
        self.ensure_option(&current);
    }

    fn ensure_option(&mut self, id: &str) {
        if id.is_empty() || self.options.iter().any(|o| o.id == id) {
            return;
        }
        self.options.push(CampaignOption::manual(id));
    }

    /// Persist identity and options.
    ///
    /// # Errors
    /// Returns [`StoreError`] if either value could not be written.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store::set_json(store, store::CAMPAIGN_KEY, &self.identity)?;
        store::set_json(store, store::CAMPAIGN_OPTIONS_KEY, &self.options)
    }
}
