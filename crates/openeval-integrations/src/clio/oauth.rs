//! Clio OAuth 2.0: authorize URL, token exchange and refresh, user lookup,
//! custom action registration and deauthorization.

use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde_json::json;
use url::Url;

use super::types::{Envelope, UserPayload};
use super::{ClioClient, ClioResult, TokenResponse};

/// Tokens expiring within this window are refreshed before use.
pub const REFRESH_SKEW_SECS: i64 = 60;

/// Label shown on the Clio custom action.
pub const CUSTOM_ACTION_LABEL: &str = "Request OpenEval Quote";

/// Clio screens the custom action is attached to.
pub const CUSTOM_ACTION_UI_REFERENCES: &[&str] = &["matters/show", "documents/show"];

/// Result of registering one custom action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomActionRegistration {
    Created,
    /// Clio answered 422, which it does when the action is already registered.
    AlreadyExists,
}

/// Whether a stored token should be refreshed before use.
pub fn needs_refresh(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expires_at {
        Some(at) => at <= now + Duration::seconds(REFRESH_SKEW_SECS),
        None => false,
    }
}

impl ClioClient {
    /// URL the browser is redirected to when starting the connect flow.
    pub fn authorize_url(&self, state: &str) -> ClioResult<Url> {
        let mut url = self.url("/oauth/authorize")?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config().client_id)
            .append_pair("redirect_uri", &self.config().redirect_uri)
            .append_pair("state", state);
        Ok(url)
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> ClioResult<TokenResponse> {
        let config = self.config();
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .await
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Clio may omit `refresh_token` in the response, in which case the old
    /// one stays valid.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> ClioResult<TokenResponse> {
        let config = self.config();
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> ClioResult<TokenResponse> {
        let url = self.url("/oauth/token")?;
        let response = self.http().post(url).form(form).send().await?;
        Self::json(response).await
    }

    /// The Clio user id the token belongs to.
    pub async fn who_am_i(&self, token: &str) -> ClioResult<i64> {
        let url = self.url("/api/v4/users/who_am_i.json")?;
        let response = self
            .http()
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", "id")])
            .send()
            .await?;
        let payload: Envelope<UserPayload> = Self::json(response).await?;
        Ok(payload.data.id)
    }

    pub async fn register_custom_action(
        &self,
        token: &str,
        target_url: &str,
        ui_reference: &str,
    ) -> ClioResult<CustomActionRegistration> {
        let url = self.url("/api/v4/custom_actions.json")?;
        let response = self
            .http()
            .post(url)
            .bearer_auth(token)
            .json(&json!({
                "data": {
                    "label": CUSTOM_ACTION_LABEL,
                    "target_url": target_url,
                    "ui_reference": ui_reference,
                }
            }))
            .send()
            .await?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            return Ok(CustomActionRegistration::AlreadyExists);
        }
        Self::check(response).await?;
        Ok(CustomActionRegistration::Created)
    }

    /// Register the quote custom action on every supported screen.
    ///
    /// Failures are logged and swallowed; a connection without custom
    /// actions is still usable. Returns how many registrations succeeded.
    pub async fn register_default_custom_actions(&self, token: &str, target_url: &str) -> usize {
        let mut registered = 0;
        for &ui_reference in CUSTOM_ACTION_UI_REFERENCES {
            match self
                .register_custom_action(token, target_url, ui_reference)
                .await
            {
                Ok(outcome) => {
                    tracing::debug!(ui_reference, ?outcome, "Clio custom action registered");
                    registered += 1;
                }
                Err(e) => {
                    tracing::warn!(ui_reference, error = %e, "Failed to register Clio custom action");
                }
            }
        }
        registered
    }

    /// Revoke the token at Clio.
    pub async fn deauthorize(&self, token: &str) -> ClioResult<()> {
        let url = self.url("/oauth/deauthorize")?;
        let response = self
            .http()
            .post(url)
            .bearer_auth(token)
            .form(&[("token", token)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clio::ClioConfig;

    fn client() -> ClioClient {
        ClioClient::with_http(
            ClioConfig {
                base_url: Url::parse("https://eu.app.clio.com").unwrap(),
                client_id: "client-1".to_string(),
                client_secret: "secret".to_string(),
                redirect_uri: "https://api.openeval.test/api/clio/oauth/callback".to_string(),
            },
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_authorize_url() {
        let url = client().authorize_url("abc123").unwrap();
        assert_eq!(url.host_str(), Some("eu.app.clio.com"));
        assert_eq!(url.path(), "/oauth/authorize");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("client_id".into(), "client-1".into())));
        assert!(pairs.contains(&("state".into(), "abc123".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "https://api.openeval.test/api/clio/oauth/callback".into()
        )));
        assert!(!url.as_str().contains("secret"));
    }

    #[test]
    fn test_needs_refresh() {
        let now = Utc::now();
        assert!(!needs_refresh(None, now));
        assert!(!needs_refresh(Some(now + Duration::hours(1)), now));
        assert!(needs_refresh(Some(now + Duration::seconds(30)), now));
        assert!(needs_refresh(Some(now - Duration::minutes(5)), now));
    }
}
