//! Stored Clio credentials: sealing, unsealing and just-in-time refresh.

use chrono::Utc;
use openeval_core::TokenVault;
use openeval_integrations::clio::TokenResponse;
use openeval_integrations::clio::oauth::needs_refresh;
use openeval_store::{CLIO_PROVIDER, UserIntegrationRow};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Vault envelopes for a token response.
#[derive(Debug, Clone)]
pub struct SealedTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

pub fn seal_tokens(vault: &TokenVault, tokens: &TokenResponse) -> ApiResult<SealedTokens> {
    Ok(SealedTokens {
        access_token: vault.encrypt(&tokens.access_token)?,
        refresh_token: tokens
            .refresh_token
            .as_deref()
            .map(|t| vault.encrypt(t))
            .transpose()?,
    })
}

/// Load a user's Clio connection, or 404 if they never connected.
pub async fn clio_integration(state: &AppState, user_id: Uuid) -> ApiResult<UserIntegrationRow> {
    state
        .store()
        .get_user_integration(user_id, CLIO_PROVIDER)
        .await?
        .ok_or_else(|| ApiError::NotFound("Clio is not connected for this user".to_string()))
}

/// Plaintext access token for a user's Clio connection.
pub async fn clio_access_token(state: &AppState, user_id: Uuid) -> ApiResult<String> {
    let integration = clio_integration(state, user_id).await?;
    access_token_for(state, &integration).await
}

/// Plaintext access token for a stored connection, refreshed first when it
/// expires within a minute and a refresh token is on file.
pub async fn access_token_for(
    state: &AppState,
    integration: &UserIntegrationRow,
) -> ApiResult<String> {
    let vault = state.vault();
    let access_token = vault.decrypt(&integration.access_token)?;

    let Some(sealed_refresh) = integration.refresh_token.as_deref() else {
        return Ok(access_token);
    };
    if !needs_refresh(integration.expires_at, Utc::now()) {
        return Ok(access_token);
    }

    let refresh_token = vault.decrypt(sealed_refresh)?;
    let tokens = state.clio().refresh_access_token(&refresh_token).await?;
    let sealed = seal_tokens(vault, &tokens)?;

    state
        .store()
        .update_integration_tokens(
            integration.user_id,
            CLIO_PROVIDER,
            &sealed.access_token,
            sealed.refresh_token.as_deref(),
            tokens.expires_at(Utc::now()),
        )
        .await?;

    tracing::info!(user_id = %integration.user_id, "Refreshed Clio access token");
    Ok(tokens.access_token)
}
