//! API key management for signed-in users.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use chrono::{DateTime, Utc};
use openeval_core::api_key::generate_api_key;
use openeval_store::{ApiKeyRow, NewApiKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
}

/// An API key without its hash.
#[derive(Debug, Serialize)]
pub struct ApiKeySummary {
    pub id: Uuid,
    pub name: String,
    pub key_prefix: String,
    pub revoked: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ApiKeyRow> for ApiKeySummary {
    fn from(row: ApiKeyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            key_prefix: row.key_prefix,
            revoked: row.revoked,
            last_used_at: row.last_used_at,
            created_at: row.created_at,
        }
    }
}

/// Returned once, at creation. `key` is never shown again.
#[derive(Debug, Serialize)]
pub struct CreateApiKeyResponse {
    pub key: String,
    #[serde(flatten)]
    pub summary: ApiKeySummary,
}

#[derive(Debug, Serialize)]
pub struct ListApiKeysResponse {
    pub keys: Vec<ApiKeySummary>,
}

fn validate_name(name: &str) -> ApiResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name)
}

/// POST /api/api-keys - Mint a key for the caller.
///
/// # Response
///
/// - 201 Created: Key material, shown only in this response
/// - 400 Bad Request: Empty or overlong name
async fn create_api_key(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateApiKeyRequest>,
) -> ApiResult<(StatusCode, Json<CreateApiKeyResponse>)> {
    let name = validate_name(&req.name)?.to_string();

    let generated = tokio::task::spawn_blocking(generate_api_key)
        .await
        .map_err(|e| ApiError::Internal(format!("API key generation failed: {}", e)))??;

    let row = state
        .store()
        .insert_api_key(&NewApiKey {
            user_id: user.user_id,
            name,
            hashed_key: generated.hash,
            key_prefix: generated.prefix,
        })
        .await?;

    tracing::info!(key_id = %row.id, user_id = %user.user_id, "API key created");

    Ok((
        StatusCode::CREATED,
        Json(CreateApiKeyResponse {
            key: generated.raw,
            summary: row.into(),
        }),
    ))
}

/// GET /api/api-keys - The caller's keys, revoked ones included.
async fn list_api_keys(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ListApiKeysResponse>> {
    let rows = state.store().list_api_keys(user.user_id).await?;
    Ok(Json(ListApiKeysResponse {
        keys: rows.into_iter().map(Into::into).collect(),
    }))
}

/// DELETE /api/api-keys/{id} - Revoke one of the caller's keys.
///
/// # Response
///
/// - 204 No Content: Revoked
/// - 404 Not Found: No such key for this user
async fn revoke_api_key(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.store().revoke_api_key(id, user.user_id).await? {
        return Err(ApiError::NotFound(format!("API key {} not found", id)));
    }
    tracing::info!(key_id = %id, user_id = %user.user_id, "API key revoked");
    Ok(StatusCode::NO_CONTENT)
}

/// Build API key routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/api-keys", get(list_api_keys).post(create_api_key))
        .route("/api/api-keys/{id}", delete(revoke_api_key))
}
