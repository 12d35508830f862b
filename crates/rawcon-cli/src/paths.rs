//! Centralised rawcon user-directory resolution.
//!
//! When `RAWCON_HOME` is set, it replaces **all** platform-native user
//! directories (config and data).
//!
//! Priority for the console database:
//!   1. `RAWCON_DB_PATH` env var
//!   2. `RAWCON_HOME`            (if set)
//!   3. `dirs::data_local_dir().map(|d| d.join("rawcon"))`

use std::path::PathBuf;

/// Return the `RAWCON_HOME` path when set and non-empty, otherwise fall
/// through to the platform-native `dirs_fallback`.
fn resolve_user_path(dirs_fallback: Option<PathBuf>) -> Option<PathBuf> {
    if let Ok(home) = std::env::var("RAWCON_HOME")
        && !home.is_empty()
    {
        return Some(PathBuf::from(home));
    }
    dirs_fallback
}

/// Base directory for `config.toml`.
pub fn user_dir() -> Option<PathBuf> {
    resolve_user_path(dirs::config_dir().map(|d| d.join("rawcon")))
}

/// Base directory for the console database.
pub fn user_data_dir() -> Option<PathBuf> {
    resolve_user_path(dirs::data_local_dir().map(|d| d.join("rawcon")))
}

/// Location of the console database (`RAWCON_DB_PATH` wins).
pub fn db_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("RAWCON_DB_PATH")
        && !p.is_empty()
    {
        return Some(PathBuf::from(p));
    }
    user_data_dir().map(|d| d.join("console.db"))
}

/// Location of the optional user config file.
pub fn config_path() -> Option<PathBuf> {
    user_dir().map(|d| d.join("config.toml"))
}
