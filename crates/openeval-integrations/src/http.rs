//! Shared outbound HTTP plumbing.

use std::time::Duration;

use serde_json::Value;

/// Upper bound on any single provider call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_ERROR_TEXT: usize = 300;

/// Build the `reqwest` client shared by every provider client.
pub fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("openeval/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Pull the most specific human-readable message out of a provider error body.
///
/// Understands `{"error":{"message":..}}`, `{"error":".."}`, `{"message":..}`
/// and `{"errors":[{"message":..}]}`. Anything else falls back to the raw
/// body, truncated.
pub fn provider_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let candidates = [
            json.pointer("/error/message"),
            json.get("error"),
            json.get("message"),
            json.pointer("/errors/0/message"),
        ];
        for candidate in candidates.into_iter().flatten() {
            if let Some(text) = candidate.as_str() {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    match trimmed.char_indices().nth(MAX_ERROR_TEXT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_error_message() {
        let body = r#"{"error":{"type":"invalid_request","message":"Name is taken"}}"#;
        assert_eq!(provider_error_message(body), "Name is taken");
    }

    #[test]
    fn test_flat_error_string() {
        assert_eq!(
            provider_error_message(r#"{"error":"invalid_grant"}"#),
            "invalid_grant"
        );
        assert_eq!(
            provider_error_message(r#"{"message":"Missing API key"}"#),
            "Missing API key"
        );
        assert_eq!(
            provider_error_message(r#"{"errors":[{"message":"bad"}]}"#),
            "bad"
        );
    }

    #[test]
    fn test_non_json_body_is_truncated() {
        let body = "x".repeat(1000);
        let message = provider_error_message(&body);
        assert!(message.ends_with("..."));
        assert_eq!(message.len(), MAX_ERROR_TEXT + 3);
        assert_eq!(provider_error_message("  "), "empty response body");
        assert_eq!(provider_error_message("Bad Gateway"), "Bad Gateway");
    }
}
