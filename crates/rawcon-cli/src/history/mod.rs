use chrono::{DateTime, SecondsFormat, Utc};

pub use rawcon_common::history::{FETCH_ERROR, FailureKind, HistoryEntry, Status};

use crate::store::{self, KeyValueStore, StoreError};

/// Maximum number of entries kept; older entries are evicted from the tail.
pub const HISTORY_LIMIT: usize = 200;

/// Most-recent-first list of exchanges, mirrored to the store after every
/// mutation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<HistoryEntry>,
}

impl Ledger {
    /// Load the persisted ledger. Missing or malformed data yields an empty one.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            entries: decode_entries(store.get(store::HISTORY_KEY).as_deref()),
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, where 0 is the most recent.
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Insert `entry` at the head of the stored ledger, evict past
    /// [`HISTORY_LIMIT`] and persist, as one store update.
    ///
    /// The stored ledger is re-read inside the update, so entries appended by
    /// other processes since [`Ledger::load`] are kept; the in-memory ledger
    /// is then replaced by the merged result. When persisting fails the entry
    /// is still added in memory.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the updated ledger could not be written.
    pub fn append(
        &mut self,
        store: &dyn KeyValueStore,
        entry: HistoryEntry,
    ) -> Result<(), StoreError> {
        let mut merged = None;
        let result = store.update(store::HISTORY_KEY, &mut |stored| {
            let mut entries = decode_entries(stored);
            entries.insert(0, entry.clone());
            entries.truncate(HISTORY_LIMIT);
            let raw = serde_json::to_string(&entries)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            merged = Some(entries);
            Ok(raw)
        });

        match (result, merged) {
            (Ok(()), Some(entries)) => {
                self.entries = entries;
                Ok(())
            }
            (result, _) => {
                self.entries.insert(0, entry);
                self.entries.truncate(HISTORY_LIMIT);
                result
            }
        }
    }

    /// Drop every entry and persist the empty ledger.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the empty ledger could not be written.
    pub fn clear(&mut self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        self.entries.clear();
        self.persist(store)
    }

    /// Pretty-printed JSON array of every entry, most recent first.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn export(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.entries)
    }

    fn persist(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store::set_json(store, store::HISTORY_KEY, &self.entries)
    }
}

/// Stored ledger text to entries; absent or malformed text is an empty ledger.
fn decode_entries(raw: Option<&str>) -> Vec<HistoryEntry> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let mut entries: Vec<HistoryEntry> = serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::debug!("ignoring unreadable history: {e}");
        Vec::new()
    });
    entries.truncate(HISTORY_LIMIT);
    entries
}

/// ISO-8601 UTC timestamp with millisecond precision.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `raw-console-history-<timestamp>.json`, with `:` and `.` made filename-safe.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    let stamp = timestamp(now).replace([':', '.'], "-");
    format!("raw-console-history-{stamp}.json")
}

/// Human-readable listing.
///
/// The head entry always shows its request and response bodies; the rest do
/// too when `full` is set, otherwise only their summary and URL lines.
pub fn render(entries: &[HistoryEntry], full: bool) -> String {
    if entries.is_empty() {
        return "No requests yet.\n".to_owned();
    }
    let mut out = String::new();
    for (index, entry) in entries.iter().enumerate() {
        out.push_str(&format!("[{index}] {}\n", entry.summary_line()));
        out.push_str(&format!("    {}\n", entry.url_line()));
        if full || index == 0 {
            out.push_str(&render_bodies(entry));
        }
    }
    out
}

fn render_bodies(entry: &HistoryEntry) -> String {
    format!(
        "--- Request Raw ---\n{}\n--- Response Raw ---\n{}\n",
        entry.request_raw, entry.response_raw
    )
}
