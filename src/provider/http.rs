//! Shared HTTP client and error mapping.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::ParleyError;

/// Upper bound for any single HTTP call; a hung endpoint fails the turn
/// with `Timeout` once this elapses.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Join a base URL and an endpoint path without doubling slashes.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> ParleyError {
    let message = extract_error_message(body).unwrap_or_else(|| body.to_string());
    match status {
        401 | 403 => ParleyError::Authentication(format!("status {status}: {message}")),
        429 => ParleyError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => ParleyError::api(status, message),
    }
}

/// Pull `error.message` (or a string `error`) out of a JSON error body.
fn extract_error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn joins_endpoints() {
        assert_eq!(endpoint("https://x/v1/", "/models"), "https://x/v1/models");
        assert_eq!(endpoint("https://x/v1", "chat/completions"), "https://x/v1/chat/completions");
    }

    #[test]
    fn maps_statuses_to_kinds() {
        assert_eq!(status_to_error(401, "{}").kind(), ErrorKind::InvalidCredential);
        assert_eq!(status_to_error(404, "no such model").kind(), ErrorKind::EndpointNotFound);
        assert_eq!(status_to_error(429, "{}").kind(), ErrorKind::RateLimited);
        assert_eq!(status_to_error(500, "boom").kind(), ErrorKind::Unknown);
    }

    #[test]
    fn prefers_json_error_message() {
        let err = status_to_error(400, r#"{"error":{"message":"bad model id"}}"#);

        assert_eq!(err.to_string(), "API error (status 400): bad model id");
    }

    #[test]
    fn reads_retry_after_seconds() {
        let err = status_to_error(429, r#"{"error":{"retry_after":1.5}}"#);

        assert!(matches!(
            err,
            ParleyError::RateLimited {
                retry_after_ms: Some(1500)
            }
        ));
    }
}
