//! Plain-text email delivery through Resend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::{build_http_client, provider_error_message};

pub const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";

#[derive(Error, Debug)]
pub enum ResendError {
    #[error("Resend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Resend API error ({status}): {message}")]
    Api { status: u16, message: String },
}

pub type ResendResult<T> = Result<T, ResendError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Clone)]
pub struct ResendClient {
    http: reqwest::Client,
    api_key: String,
    from: String,
    base_url: String,
}

impl std::fmt::Debug for ResendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendClient")
            .field("from", &self.from)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ResendClient {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> ResendResult<Self> {
        Ok(Self::with_http(api_key, from, build_http_client()?))
    }

    pub fn with_http(
        api_key: impl Into<String>,
        from: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            from: from.into(),
            base_url: DEFAULT_RESEND_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }

    /// Send a message and return Resend's message id.
    pub async fn send(&self, message: &EmailMessage) -> ResendResult<String> {
        let body = SendEmailRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.text,
        };

        let response = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ResendError::Api {
                status: status.as_u16(),
                message: provider_error_message(&text),
            });
        }

        let sent: SendEmailResponse = response.json().await?;
        tracing::info!(email_id = %sent.id, recipients = message.to.len(), "Email sent");
        Ok(sent.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let to = vec!["ana@example.com".to_string()];
        let body = SendEmailRequest {
            from: "OpenEval <quotes@openeval.test>",
            to: &to,
            subject: "Your quote",
            text: "Hello",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["from"], "OpenEval <quotes@openeval.test>");
        assert_eq!(json["to"][0], "ana@example.com");
        assert_eq!(json["text"], "Hello");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = ResendClient::with_http("re_secret", "a@b.test", reqwest::Client::new());
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("re_secret"));
        assert!(rendered.contains("a@b.test"));
    }
}
