//! Command implementations and the helpers they share.

pub mod api_keys;
pub mod clio_quotes;
pub mod documents;
pub mod gen_key;
pub mod request_quote;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors talking to the OpenEval API.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("{message} ({status} {code})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("{0} is required for this command")]
    MissingCredential(&'static str),
}

/// Output that can also be rendered for people.
pub trait HumanReadable {
    fn print_human(&self);
}

/// HTTP client with the session token, when one was given, as the default
/// bearer credential.
pub fn build_client(token: Option<&str>) -> Result<reqwest::Client, CliError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| CliError::InvalidToken(e.to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(reqwest::Client::builder()
        .user_agent(concat!("openeval-cli/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .build()?)
}

/// Turn a non-2xx response into [`CliError::Api`].
pub fn api_error(status: u16, body: &str) -> CliError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.pointer(&format!("/error/{}", name)))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    CliError::Api {
        status,
        code: field("code").unwrap_or_else(|| "UNKNOWN".to_string()),
        message: field("message").unwrap_or_else(|| {
            if body.trim().is_empty() {
                "empty response".to_string()
            } else {
                truncate(body.trim(), 200)
            }
        }),
    }
}

/// Send a request and check its status.
pub async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, CliError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(api_error(status.as_u16(), &body))
}

/// Send a request and decode its JSON body.
pub async fn make_request<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, CliError> {
    Ok(send(request).await?.json::<T>().await?)
}

/// Print JSON, or the human rendering with `--human`.
pub fn output<T: Serialize + HumanReadable>(value: &T, human: bool) -> Result<()> {
    if human {
        value.print_human();
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Shorten `s` to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Ask for confirmation on stderr. Anything but `y` declines.
pub fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;

    eprint!("{} [y/N] ", prompt);
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_from_server_body() {
        let err = api_error(
            400,
            r#"{"error":{"code":"MISSING_MATTER","message":"No Clio Matter ID is assigned"}}"#,
        );
        match err {
            CliError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, "MISSING_MATTER");
                assert_eq!(message, "No Clio Matter ID is assigned");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_from_plain_body() {
        let err = api_error(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Bad Gateway (502 UNKNOWN)");

        let err = api_error(500, "");
        assert!(err.to_string().starts_with("empty response"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
        assert_eq!(truncate("ñññññññ", 5), "ññ...");
    }

    #[test]
    fn test_build_client_rejects_bad_token() {
        assert!(build_client(Some("line\nbreak")).is_err());
        assert!(build_client(None).is_ok());
    }
}
