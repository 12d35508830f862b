use std::path::{Path, PathBuf};

/// Settings read from the optional `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Base URL used when none has been saved in the store.
    pub base_url: Option<String>,
    /// Default directory for `history export`.
    pub export_dir: Option<PathBuf>,
}

/// Private: parsed representation of a rawcon config file.
#[derive(serde::Deserialize, Default)]
struct RawConfigFile {
    console: Option<ConsoleSection>,
    export: Option<ExportSection>,
}

#[derive(serde::Deserialize)]
struct ConsoleSection {
    base_url: Option<String>,
}

#[derive(serde::Deserialize)]
struct ExportSection {
    dir: Option<PathBuf>,
}

impl ConsoleConfig {
    /// Load `{user_dir}/config.toml`, falling back to defaults.
    pub fn load() -> Self {
        crate::paths::config_path().map_or_else(Self::default, |p| Self::load_from(&p))
    }

    /// Load from an explicit path. A missing or malformed file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        let parsed: RawConfigFile = match toml::from_str(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("ignoring malformed config {}: {e}", path.display());
                return Self::default();
            }
        };
        Self {
            base_url: parsed
                .console
                .and_then(|c| c.base_url)
                .and_then(|u| normalize_base_url(&u)),
            export_dir: parsed.export.and_then(|e| e.dir),
        }
    }
}

/// Trim whitespace and trailing slashes; an empty result means "no base URL".
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
