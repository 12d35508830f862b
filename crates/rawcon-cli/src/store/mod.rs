pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Key holding the saved base URL override.
pub const BASE_URL_KEY: &str = "raw-console-base-url";
/// Key holding the serialized history array.
pub const HISTORY_KEY: &str = "raw-console-history";
/// Key holding the current/previous campaign identity.
pub const CAMPAIGN_KEY: &str = "raw-console-campaign";
/// Key holding the known campaign options.
pub const CAMPAIGN_OPTIONS_KEY: &str = "raw-console-campaign-options";

/// Key for one editor buffer's text.
pub fn buffer_key(name: &str) -> String {
    format!("raw-console-buffer-{name}")
}

/// A write that could not be persisted.
#[derive(Debug)]
pub enum StoreError {
    /// The backing store rejected the write (read-only, full, locked, ...).
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Durable string key-value storage.
///
/// Reads never fail: an unreadable value is reported as absent. Writes
/// return [`StoreError`] so callers can surface a status message instead of
/// aborting.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    /// Insert or replace `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the value could not be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`; deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the delete could not be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Read-modify-write `key` atomically with respect to other writers.
    ///
    /// `f` receives the stored value (if any) and returns the replacement.
    /// Nothing is written when `f` fails.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the update could not be
    /// written, or the error returned by `f`.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<&str>) -> Result<String, StoreError>,
    ) -> Result<(), StoreError>;
}

/// Read and decode a JSON value, treating corrupt data as absent.
pub fn get_json<T: serde::de::DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("ignoring unreadable value under {key}: {e}");
            None
        }
    }
}

/// Encode `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if encoding or the write fails.
pub fn set_json<T: serde::Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|e| StoreError::Unavailable(e.to_string()))?;
    store.set(key, &raw)
}
