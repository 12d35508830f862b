use std::time::{Duration, Instant};

use reqwest::Method;
use reqwest::blocking::Client;

use crate::history::{self, HistoryEntry, Ledger, Status};
use crate::store::{KeyValueStore, StoreError};

/// Status message shown when the ledger could not be written.
pub const HISTORY_NOT_SAVED: &str = "History could not be saved.";

/// Outcome of one exchange. Failures are data here, never errors.
#[derive(Debug)]
pub struct SendResult {
    /// True only for 2xx responses.
    pub ok: bool,
    pub status: Status,
    /// Response body verbatim, or the transport failure's diagnostic text.
    pub response_text: String,
    pub latency_ms: u64,
    /// `<METHOD> <path> -> <status> in <latency>ms`
    pub status_line: String,
    /// Set when the history entry was recorded in memory but not persisted.
    pub persist_error: Option<StoreError>,
}

/// Executes single HTTP exchanges and records each one in the ledger.
pub struct Dispatcher {
    client: Client,
    base_url: Option<String>,
}

impl Dispatcher {
    pub const fn new(client: Client, base_url: Option<String>) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn set_base_url(&mut self, base_url: Option<String>) {
        self.base_url = base_url;
    }

    pub fn resolve(&self, path: &str) -> String {
        super::resolve_url(self.base_url(), path)
    }

    /// Send one request and append its history entry.
    ///
    /// `body` is sent byte-for-byte with a JSON content type; it is never
    /// re-serialized or validated, so malformed JSON reaches the server as typed.
    pub fn send(
        &self,
        ledger: &mut Ledger,
        store: &dyn KeyValueStore,
        method: &Method,
        path: &str,
        body: Option<&str>,
    ) -> SendResult {
        let url = self.resolve(path);
        tracing::debug!(%method, %url, "dispatching");

        let start = Instant::now();
        let outcome = self.exchange(method, &url, body);
        let latency_ms = round_millis(start.elapsed());

        let (ok, status, response_text) = match outcome {
            Ok((code, text)) => {
                let status = Status::Http(code);
                (status.is_success(), status, text)
            }
            Err(e) => {
                tracing::debug!("transport failure for {url}: {e}");
                (false, Status::FetchError, describe_failure(e))
            }
        };

        let entry = HistoryEntry {
            timestamp: history::timestamp(chrono::Utc::now()),
            endpoint: format!("{method} {path}"),
            url,
            status: status.clone(),
            latency: latency_ms,
            request_raw: body.unwrap_or_default().to_owned(),
            response_raw: response_text.clone(),
        };
        let persist_error = ledger.append(store, entry).err();
        if let Some(e) = &persist_error {
            tracing::warn!("{HISTORY_NOT_SAVED} {e}");
        }

        SendResult {
            ok,
            status_line: format!("{method} {path} -> {status} in {latency_ms}ms"),
            status,
            response_text,
            latency_ms,
            persist_error,
        }
    }

    fn exchange(
        &self,
        method: &Method,
        url: &str,
        body: Option<&str>,
    ) -> Result<(u16, String), reqwest::Error> {
        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.to_owned());
        }
        let response = request.send()?;
        let code = response.status().as_u16();
        let text = response.text()?;
        Ok((code, text))
    }
}

/// Full error chain of a transport failure, outermost first.
fn describe_failure(e: reqwest::Error) -> String {
    format!("{:?}", anyhow::Error::new(e))
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn round_millis(elapsed: Duration) -> u64 {
    (elapsed.as_secs_f64() * 1000.0).round() as u64
}
