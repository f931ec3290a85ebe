//! HTTP helper functions for Crux Core
//!
//! Response handling shared by every gateway request, kept out of the
//! request builders so it can be read and tested on its own.

use crux_http::Response;

/// Base URL for device API endpoints.
///
/// NOTE: This is a dummy prefix required because `crux_http` requires absolute
/// URLs and rejects relative paths (`RelativeUrlWithoutBase` error).
/// The web shell strips this prefix before calling `fetch()`, which keeps
/// requests relative to the page the device served. A native shell replaces
/// it with the device address.
pub const BASE_URL: &str = "https://relative";

/// Constructs the full address from a given path.
///
/// # Example
/// ```
/// use calid_ui_core::http_helpers::build_url;
/// let url = build_url("/api/data");
/// assert_eq!(url, "https://relative/api/data");
/// ```
pub fn build_url(path: &str) -> String {
    format!("{BASE_URL}{path}")
}

/// Joins the configured API prefix and an endpoint.
///
/// # Example
/// ```
/// use calid_ui_core::http_helpers::api_url;
/// assert_eq!(api_url("/api/", "/config"), "https://relative/api/config");
/// assert_eq!(api_url("", "/config"), "https://relative/config");
/// ```
pub fn api_url(api_base: &str, endpoint: &str) -> String {
    build_url(&format!("{}{endpoint}", api_base.trim_end_matches('/')))
}

/// Returns `true` if the response status is 2xx.
pub fn is_response_success(response: &Response<Vec<u8>>) -> bool {
    response.status().is_success()
}

/// Extracts error message from HTTP response.
pub fn extract_error_message(action: &str, response: &mut Response<Vec<u8>>) -> String {
    let status = response.status().to_string();

    match response.take_body() {
        Some(body) if body.is_empty() => format!("{action} failed: HTTP {status} (Empty body)"),
        Some(body) => match String::from_utf8(body) {
            Ok(msg) => format!("{action} failed: HTTP {status}: {msg}"),
            Err(e) => format!("{action} failed: HTTP {status} (Invalid UTF-8: {e})"),
        },
        None => format!("{action} failed: HTTP {status} (No body)"),
    }
}

/// Parse JSON from response body.
///
/// Returns error if response is not successful or JSON parsing fails.
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    action: &str,
    response: &mut Response<Vec<u8>>,
) -> Result<T, String> {
    if !is_response_success(response) {
        return Err(extract_error_message(action, response));
    }

    match response.take_body() {
        Some(body) => {
            serde_json::from_slice(&body).map_err(|e| format!("{action}: JSON parse error: {e}"))
        }
        None => Err(format!("{action}: Empty response body")),
    }
}

/// Check response status only (no body parsing).
pub fn check_response_status(action: &str, response: &mut Response<Vec<u8>>) -> Result<(), String> {
    if is_response_success(response) {
        Ok(())
    } else {
        Err(extract_error_message(action, response))
    }
}

/// Extract plain text body from response (e.g. the device log).
pub fn extract_string_response(
    action: &str,
    response: &mut Response<Vec<u8>>,
) -> Result<String, String> {
    if !is_response_success(response) {
        return Err(extract_error_message(action, response));
    }

    match response.take_body() {
        Some(bytes) => {
            String::from_utf8(bytes).map_err(|_| format!("{action}: Invalid UTF-8 in response"))
        }
        None => Ok(String::new()),
    }
}

/// Process HTTP response result and check status only (no JSON parsing)
pub fn process_status_response(
    action: &str,
    result: crux_http::Result<Response<Vec<u8>>>,
) -> Result<(), String> {
    match result {
        Ok(mut response) => check_response_status(action, &mut response),
        Err(e) => Err(format!("{action} failed: {e}")),
    }
}

/// Process HTTP response result and parse JSON
pub fn process_json_response<T: serde::de::DeserializeOwned>(
    action: &str,
    result: crux_http::Result<Response<Vec<u8>>>,
) -> Result<T, String> {
    match result {
        Ok(mut response) => parse_json_response(action, &mut response),
        Err(e) => Err(format!("{action} failed: {e}")),
    }
}

/// Process HTTP response result and return the text body
pub fn process_string_response(
    action: &str,
    result: crux_http::Result<Response<Vec<u8>>>,
) -> Result<String, String> {
    match result {
        Ok(mut response) => extract_string_response(action, &mut response),
        Err(e) => Err(format!("{action} failed: {e}")),
    }
}

/// Collapse a failed request into the sentinel the caller expects.
///
/// The failure is logged, never surfaced as an error value.
pub fn or_sentinel<T>(action: &str, result: Result<T, String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("{e}");
            log::debug!("{action}: falling back to sentinel");
            None
        }
    }
}

// Note: Unit tests for the response helpers are not included because
// crux_http::Response has a private constructor. They are exercised through
// the gateway requests in `tests.rs`.
