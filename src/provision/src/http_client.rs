use anyhow::{Context, Result, ensure};
use reqwest::{Client, Response};
use std::time::Duration;

/// Device web servers answer slowly while scanning; anything beyond this is a dead link.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Create the HTTP client used for all device requests
pub fn device_http_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to create device HTTP client")
}

/// Handle HTTP response by checking status and extracting body
///
/// This is a common utility for processing HTTP responses.
/// It ensures the response status is successful and extracts the body text.
///
/// # Arguments
/// * `res` - The HTTP response to handle
/// * `context_msg` - Context message describing the request (e.g., "GET /api/config")
///
/// # Returns
/// * `Ok(String)` - The response body if the status is successful
/// * `Err` - If the status is not successful or reading the body fails
pub async fn handle_http_response(res: Response, context_msg: &str) -> Result<String> {
    let status = res.status();
    let body = res.text().await.context("failed to read response body")?;

    ensure!(
        status.is_success(),
        "{context_msg} failed with status {status} and body: {body}"
    );

    Ok(body)
}

/// Collapse a failed request into the value the caller shows instead.
///
/// The error is logged with its full context chain and dropped.
pub fn or_sentinel<T>(action: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("{action} failed: {e:#}");
            None
        }
    }
}
