/// Build the blocking HTTP client used for every exchange.
///
/// No request timeout is set: an exchange runs until it completes or the
/// transport fails.
///
/// # Errors
///
/// Returns an error if the client cannot be constructed (e.g., invalid TLS config).
pub fn build_client() -> anyhow::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(None)
        .user_agent(concat!("rawcon/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| anyhow::anyhow!("could not build HTTP client: {e}"))
}
