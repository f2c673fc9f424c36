//! Shared HTTP client construction and request URL helpers.

use std::time::Duration;

use reqwest::Client;

const USER_AGENT: &str = concat!("pagepulse/", env!("CARGO_PKG_VERSION"));

/// Build a client with the crate user agent and a fixed per-request timeout.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .gzip(true)
        .build()
}

/// Append `name=value` to `base`, percent-encoding the value completely.
pub fn append_query(base: &str, name: &str, value: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!(
        "{}{}{}={}",
        base,
        separator,
        name,
        urlencoding::encode(value)
    )
}
