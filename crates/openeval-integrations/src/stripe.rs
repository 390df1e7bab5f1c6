//! Minimal Stripe client: PaymentIntents, Customers and SetupIntents.
//!
//! Stripe takes form-encoded bodies with bracketed keys for nested fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::{build_http_client, provider_error_message};

pub const DEFAULT_STRIPE_BASE_URL: &str = "https://api.stripe.com";

#[derive(Error, Debug)]
pub enum StripeError {
    #[error("Stripe request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stripe API error ({status}): {message}")]
    Api { status: u16, message: String },
}

pub type StripeResult<T> = Result<T, StripeError>;

/// Identifier and browser secret of a PaymentIntent or SetupIntent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentSecret {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    pub id: String,
}

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Form fields for a PaymentIntent tied to a quote.
pub fn payment_intent_form(
    amount_cents: i64,
    currency: &str,
    quote_id: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("amount", amount_cents.to_string()),
        ("currency", currency.to_lowercase()),
        ("automatic_payment_methods[enabled]", "true".to_string()),
        ("metadata[quote_id]", quote_id.to_string()),
    ]
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>) -> StripeResult<Self> {
        Ok(Self::with_http(secret_key, build_http_client()?))
    }

    pub fn with_http(secret_key: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            secret_key: secret_key.into(),
            base_url: DEFAULT_STRIPE_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> StripeResult<T> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StripeError::Api {
                status: status.as_u16(),
                message: provider_error_message(&body),
            });
        }
        Ok(response.json::<T>().await?)
    }

    pub async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        quote_id: &str,
    ) -> StripeResult<IntentSecret> {
        let form = payment_intent_form(amount_cents, currency, quote_id);
        let intent: IntentSecret = self.post_form("/v1/payment_intents", &form).await?;
        tracing::info!(intent_id = %intent.id, quote_id, amount_cents, "Created Stripe PaymentIntent");
        Ok(intent)
    }

    pub async fn create_customer(&self, email: &str) -> StripeResult<Customer> {
        self.post_form("/v1/customers", &[("email", email.to_string())])
            .await
    }

    /// SetupIntent for saving a card for later off-session charges.
    pub async fn create_setup_intent(&self, customer_id: &str) -> StripeResult<IntentSecret> {
        self.post_form(
            "/v1/setup_intents",
            &[
                ("customer", customer_id.to_string()),
                ("usage", "off_session".to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_intent_form() {
        let form = payment_intent_form(12_500, "USD", "q-1");
        assert!(form.contains(&("amount", "12500".to_string())));
        assert!(form.contains(&("currency", "usd".to_string())));
        assert!(form.contains(&("automatic_payment_methods[enabled]", "true".to_string())));
        assert!(form.contains(&("metadata[quote_id]", "q-1".to_string())));
    }

    #[test]
    fn test_debug_hides_secret_key() {
        let client = StripeClient::with_http("sk_test_secret", reqwest::Client::new())
            .with_base_url("http://localhost:12111/");
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("sk_test_secret"));
        assert!(rendered.contains("http://localhost:12111\""));
    }

    #[test]
    fn test_intent_response_parses() {
        let json = r#"{"id":"pi_123","object":"payment_intent","client_secret":"pi_123_secret_abc","amount":100}"#;
        let intent: IntentSecret = serde_json::from_str(json).unwrap();
        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.client_secret, "pi_123_secret_abc");
    }
}
