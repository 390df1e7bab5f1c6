//! API key identity extraction for machine clients.

use axum::{extract::FromRequestParts, http::request::Parts};
use openeval_core::api_key::{KeyMatch, key_prefix, match_api_key};
use openeval_store::ApiKeyRow;
use uuid::Uuid;

use crate::auth::bearer_token;
use crate::error::ApiError;
use crate::state::AppState;

/// Caller authenticated with an `sk_...` API key.
#[derive(Debug, Clone)]
pub struct ApiKeyIdentity {
    pub key_id: Uuid,
    pub user_id: Uuid,
}

/// Match `raw` against the candidate rows sharing its prefix.
///
/// A hash match on a revoked key is 403; anything else that does not match
/// is 401.
pub fn authenticate_api_key(raw: &str, candidates: &[ApiKeyRow]) -> Result<ApiKeyRow, ApiError> {
    match match_api_key(raw, candidates) {
        KeyMatch::Active(row) => Ok(row.clone()),
        KeyMatch::Revoked(row) => {
            tracing::warn!(key_id = %row.id, "Revoked API key used");
            Err(ApiError::Forbidden("API key has been revoked".to_string()))
        }
        KeyMatch::NoMatch => Err(ApiError::Unauthorized("Invalid API key".to_string())),
    }
}

impl FromRequestParts<AppState> for ApiKeyIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = bearer_token(parts)?.to_string();
        let prefix = key_prefix(&raw)
            .map_err(|_| ApiError::Unauthorized("Invalid API key".to_string()))?
            .to_string();

        let candidates = state.store().find_api_keys_by_prefix(&prefix).await?;
        if candidates.is_empty() {
            return Err(ApiError::Unauthorized("Invalid API key".to_string()));
        }

        // bcrypt runs on the blocking pool
        let key = tokio::task::spawn_blocking(move || authenticate_api_key(&raw, &candidates))
            .await
            .map_err(|e| ApiError::Internal(format!("API key check failed: {}", e)))??;

        if let Err(e) = state.store().touch_api_key(key.id).await {
            tracing::warn!(key_id = %key.id, error = %e, "Failed to record API key use");
        }

        Ok(ApiKeyIdentity {
            key_id: key.id,
            user_id: key.user_id,
        })
    }
}
