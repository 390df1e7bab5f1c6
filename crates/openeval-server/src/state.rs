//! Application state shared across handlers.

use std::sync::Arc;

use openeval_core::TokenVault;
use openeval_integrations::http::build_http_client;
use openeval_integrations::{ClioClient, ClioConfig, ResendClient, StripeClient};
use openeval_store::Store;

use crate::config::{ConfigError, ServerConfig};

/// Application state shared across all handlers.
///
/// This is cloneable and can be extracted in handlers using `State<AppState>`.
/// Every client is built once at startup; nothing is reconstructed per
/// request.
#[derive(Clone)]
pub struct AppState {
    /// Database store.
    store: Arc<Store>,
    /// Server configuration.
    config: Arc<ServerConfig>,
    /// Seals provider tokens at rest.
    vault: Arc<TokenVault>,
    clio: Arc<ClioClient>,
    stripe: Option<Arc<StripeClient>>,
    resend: Option<Arc<ResendClient>>,
}

impl AppState {
    /// Build application state, constructing the vault and provider clients
    /// from configuration.
    pub fn new(store: Store, config: ServerConfig) -> Result<Self, ConfigError> {
        let vault =
            TokenVault::from_hex(&config.token_encryption_key).map_err(|e| {
                ConfigError::InvalidValue {
                    name: "TOKEN_ENCRYPTION_KEY".to_string(),
                    reason: e.to_string(),
                }
            })?;

        let http = build_http_client()?;

        let clio = ClioClient::with_http(
            ClioConfig {
                base_url: config.clio_base_url.clone(),
                client_id: config.clio_client_id.clone(),
                client_secret: config.clio_client_secret.clone(),
                redirect_uri: config.clio_redirect_uri.clone(),
            },
            http.clone(),
        );

        let stripe = config
            .stripe_secret_key
            .as_ref()
            .map(|key| Arc::new(StripeClient::with_http(key.clone(), http.clone())));

        let resend = config.resend_api_key.as_ref().map(|key| {
            Arc::new(ResendClient::with_http(
                key.clone(),
                config.email_from.clone(),
                http.clone(),
            ))
        });

        Ok(Self {
            store: Arc::new(store),
            config: Arc::new(config),
            vault: Arc::new(vault),
            clio: Arc::new(clio),
            stripe,
            resend,
        })
    }

    /// Get a reference to the database store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Get a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn vault(&self) -> &TokenVault {
        &self.vault
    }

    pub fn clio(&self) -> &ClioClient {
        &self.clio
    }

    /// Stripe client, if `STRIPE_SECRET_KEY` is set.
    pub fn stripe(&self) -> Option<&StripeClient> {
        self.stripe.as_deref()
    }

    /// Resend client, if `RESEND_API_KEY` is set.
    pub fn resend(&self) -> Option<&ResendClient> {
        self.resend.as_deref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::tests::test_config;

    /// State over a lazy pool; routes that never touch the database can be
    /// exercised without Postgres.
    pub(crate) fn test_state_with(config: ServerConfig) -> AppState {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState::new(Store::from_pool(pool), config).unwrap()
    }

    pub(crate) fn test_state() -> AppState {
        test_state_with(test_config())
    }

    #[tokio::test]
    async fn test_optional_clients_follow_config() {
        let state = test_state();
        assert!(state.stripe().is_none());
        assert!(state.resend().is_none());

        let mut config = test_config();
        config.stripe_secret_key = Some("sk_test_x".to_string());
        config.resend_api_key = Some("re_x".to_string());
        let state = test_state_with(config);
        assert!(state.stripe().is_some());
        assert_eq!(
            state.resend().unwrap().from_address(),
            "OpenEval <no-reply@openeval.app>"
        );
    }

    #[tokio::test]
    async fn test_vault_uses_configured_key() {
        let state = test_state();
        let sealed = state.vault().encrypt("access-token").unwrap();
        assert_eq!(state.vault().decrypt(&sealed).unwrap(), "access-token");
    }
}
