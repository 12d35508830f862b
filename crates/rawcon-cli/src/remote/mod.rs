pub mod dispatch;
pub mod http;

pub use dispatch::{Dispatcher, SendResult};

/// Resolve `path` against an optional base URL.
///
/// The base is used as given (callers normalize it with
/// [`crate::config::normalize_base_url`]); exactly one `/` separates it from
/// the path. Without a base the path is returned unchanged.
pub fn resolve_url(base_url: Option<&str>, path: &str) -> String {
    match base_url.map(|b| b.trim_end_matches('/')) {
        None | Some("") => path.to_owned(),
        Some(base) if path.starts_with('/') => format!("{base}{path}"),
        Some(base) => format!("{base}/{path}"),
    }
}

/// `/api/settings/schema?campaign_id=<id>` with the id form-urlencoded.
pub fn settings_schema_path(campaign_id: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("campaign_id", campaign_id)
        .finish();
    format!("/api/settings/schema?{query}")
}
