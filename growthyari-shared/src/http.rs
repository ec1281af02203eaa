/// Outbound HTTP clients
///
/// Every client talking to a third party (email API, payment gateway,
/// Google) carries a request timeout, so a stalled provider cannot hold a
/// request handler open.

use std::time::Duration;

/// Timeout for calls made inline with a user request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client with `timeout` applied to each request
pub fn client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .build()
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "HTTP client with timeout could not be built, using defaults");
            reqwest::Client::new()
        })
}
