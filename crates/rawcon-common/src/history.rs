use serde::{Deserialize, Serialize};

/// Sentinel recorded in place of an HTTP status when no response was obtained.
pub const FETCH_ERROR: &str = "FETCH_ERROR";

/// Outcome of one exchange as stored in history.
///
/// Serialized as a bare JSON number for HTTP codes and as a string otherwise,
/// so exported files keep the `"status": 200` / `"status": "FETCH_ERROR"` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawStatus", into = "RawStatus")]
pub enum Status {
    Http(u16),
    FetchError,
    /// Any other label read back from storage.
    Other(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawStatus {
    Code(u16),
    Label(String),
}

impl From<RawStatus> for Status {
    fn from(raw: RawStatus) -> Self {
        match raw {
            RawStatus::Code(code) => Self::Http(code),
            RawStatus::Label(label) if label == FETCH_ERROR => Self::FetchError,
            RawStatus::Label(label) => Self::Other(label),
        }
    }
}

impl From<Status> for RawStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Http(code) => Self::Code(code),
            Status::FetchError => Self::Label(FETCH_ERROR.to_owned()),
            Status::Other(label) => Self::Label(label),
        }
    }
}

impl Status {
    /// True for HTTP codes in the 2xx range.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Http(code) if *code >= 200 && *code < 300)
    }

    /// Classify a non-successful outcome. `None` for 2xx responses.
    pub const fn failure(&self) -> Option<FailureKind> {
        match self {
            Self::Http(code) if *code >= 200 && *code < 300 => None,
            Self::Http(_) => Some(FailureKind::Http),
            Self::FetchError | Self::Other(_) => Some(FailureKind::Transport),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{code}"),
            Self::FetchError => f.write_str(FETCH_ERROR),
            Self::Other(label) => f.write_str(label),
        }
    }
}

/// Failure taxonomy shared by the dispatcher, projector and buffer patching.
///
/// None of these abort the console: transport and HTTP failures are recorded
/// in history, decode failures blank derived views, validation failures block
/// only the patch that triggered them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No HTTP status was obtained (connection refused, DNS, invalid URL).
    Transport,
    /// The server answered with a non-2xx status.
    Http,
    /// The body was not valid JSON where JSON was expected.
    Decode,
    /// An editor buffer expected to hold a JSON object did not.
    Validation,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Transport => "transport failure",
            Self::Http => "HTTP error",
            Self::Decode => "decode failure",
            Self::Validation => "validation failure",
        };
        f.write_str(name)
    }
}

/// One recorded request/response pair.
///
/// Field names are camelCase on the wire so stored and exported history stays
/// readable by other tooling that consumes the console's export files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: String,
    /// Method and path, e.g. `POST /api/chat/turn`.
    pub endpoint: String,
    #[serde(default)]
    pub url: String,
    pub status: Status,
    /// Elapsed milliseconds, rounded.
    pub latency: u64,
    #[serde(default)]
    pub request_raw: String,
    #[serde(default)]
    pub response_raw: String,
}

impl HistoryEntry {
    /// `<timestamp> | <endpoint> | <status> | <latency>ms`
    pub fn summary_line(&self) -> String {
        format!(
            "{} | {} | {} | {}ms",
            self.timestamp, self.endpoint, self.status, self.latency
        )
    }

    pub fn url_line(&self) -> String {
        if self.url.is_empty() {
            "URL: (relative)".to_owned()
        } else {
            format!("URL: {}", self.url)
        }
    }
}
