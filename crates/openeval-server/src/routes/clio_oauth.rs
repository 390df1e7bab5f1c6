//! Clio connect flow.
//!
//! - GET /api/clio/oauth/start - Issue a state and redirect to Clio
//! - GET /api/clio/oauth/callback - Verify the state, store tokens, redirect to the app
//! - POST /api/clio/disconnect - Revoke and forget the connection
//!
//! The state is persisted server-side (single use, 15 minutes) and mirrored in
//! an HMAC-signed cookie, so a callback must present both.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use openeval_core::signing::{constant_time_eq, sign_value, verify_signed_value};
use openeval_store::{CLIO_PROVIDER, NewUserIntegration};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::clio_session::{clio_integration, seal_tokens};
use crate::error::{ApiError, ApiResult};
use crate::routes::found;
use crate::state::AppState;

/// Cookie carrying the signed OAuth state.
pub const STATE_COOKIE: &str = "clio_oauth_state";

const STATE_COOKIE_PATH: &str = "/api/clio/oauth";

/// Lifetime of an issued state.
pub const STATE_TTL_MINUTES: i64 = 15;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query string Clio sends to the callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set when the user denied access or Clio failed.
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub disconnected: bool,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn generate_state() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

fn state_cookie(secret: &str, state: &str) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, sign_value(secret.as_bytes(), state)))
        .path(STATE_COOKIE_PATH)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(STATE_TTL_MINUTES))
        .build()
}

fn clear_state_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(STATE_COOKIE).path(STATE_COOKIE_PATH))
}

/// The cookie must carry a valid signature over exactly the query-string state.
pub fn verify_state_cookie(secret: &str, cookie_value: &str, query_state: &str) -> bool {
    verify_signed_value(secret.as_bytes(), cookie_value)
        .is_some_and(|signed_state| constant_time_eq(signed_state, query_state))
}

/// Where the browser lands after the callback.
pub fn callback_redirect_url(app_base_url: &str, outcome: Result<(), &str>) -> String {
    match outcome {
        Ok(()) => format!("{}/dashboard/integrations?clio=connected", app_base_url),
        Err(message) => format!(
            "{}/dashboard/integrations?clio_error={}",
            app_base_url,
            urlencoding::encode(message)
        ),
    }
}

fn invalid_state() -> ApiError {
    ApiError::BadRequest("Invalid or expired OAuth state".to_string())
}

/// Everything between receiving the callback and storing the connection.
async fn complete_connection(
    state: &AppState,
    jar: &CookieJar,
    params: CallbackParams,
) -> ApiResult<Uuid> {
    if let Some(error) = params.error {
        return Err(ApiError::BadRequest(
            params.error_description.unwrap_or(error),
        ));
    }

    let code = params
        .code
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;
    let oauth_state = params
        .state
        .ok_or_else(|| ApiError::BadRequest("Missing OAuth state".to_string()))?;

    let cookie = jar.get(STATE_COOKIE).ok_or_else(invalid_state)?;
    if !verify_state_cookie(&state.config().cookie_secret, cookie.value(), &oauth_state) {
        tracing::warn!("OAuth state cookie did not match the callback state");
        return Err(invalid_state());
    }

    let issued = state
        .store()
        .consume_oauth_state(&oauth_state, CLIO_PROVIDER)
        .await?
        .ok_or_else(invalid_state)?;
    if issued.created_at < Utc::now() - Duration::minutes(STATE_TTL_MINUTES) {
        return Err(invalid_state());
    }
    let user_id = issued.user_id;

    let clio = state.clio();
    let tokens = clio.exchange_code(&code).await?;

    let clio_user_id = match clio.who_am_i(&tokens.access_token).await {
        Ok(id) => Some(id.to_string()),
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Could not fetch Clio user id");
            None
        }
    };

    let sealed = seal_tokens(state.vault(), &tokens)?;
    state
        .store()
        .upsert_user_integration(&NewUserIntegration {
            user_id,
            integration_name: CLIO_PROVIDER.to_string(),
            access_token: sealed.access_token,
            refresh_token: sealed.refresh_token,
            expires_at: tokens.expires_at(Utc::now()),
            integration_user_id: clio_user_id.clone(),
        })
        .await?;

    let registered = clio
        .register_default_custom_actions(&tokens.access_token, &state.config().custom_action_url())
        .await;

    tracing::info!(
        user_id = %user_id,
        clio_user_id = ?clio_user_id,
        custom_actions = registered,
        "Clio connected"
    );
    Ok(user_id)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /api/clio/oauth/start - Begin connecting Clio.
///
/// # Response
///
/// - 302 Found: to Clio's authorize page, with the signed state cookie set
/// - 401 Unauthorized: Missing or invalid session token
async fn start(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Response)> {
    let pruned = state
        .store()
        .prune_oauth_states(Duration::minutes(STATE_TTL_MINUTES))
        .await?;
    if pruned > 0 {
        tracing::debug!(pruned, "Pruned expired OAuth states");
    }

    let oauth_state = generate_state();
    state
        .store()
        .insert_oauth_state(&oauth_state, user.user_id, CLIO_PROVIDER)
        .await?;

    let authorize_url = state.clio().authorize_url(&oauth_state)?;
    let jar = jar.add(state_cookie(&state.config().cookie_secret, &oauth_state));

    tracing::info!(user_id = %user.user_id, "Starting Clio OAuth flow");
    Ok((jar, found(authorize_url.as_str())))
}

/// GET /api/clio/oauth/callback - Finish connecting Clio.
///
/// Always redirects to the app's integrations page, with `clio=connected` on
/// success or `clio_error=<message>` on failure. The state cookie is cleared
/// either way.
async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Response) {
    let outcome = complete_connection(&state, &jar, params).await;

    let app_base_url = &state.config().app_base_url;
    let location = match &outcome {
        Ok(_) => callback_redirect_url(app_base_url, Ok(())),
        Err(e) => {
            tracing::warn!(error = %e, "Clio OAuth callback failed");
            callback_redirect_url(app_base_url, Err(e.to_string().as_str()))
        }
    };

    (clear_state_cookie(jar), found(&location))
}

/// POST /api/clio/disconnect - Disconnect Clio.
///
/// Revokes the token at Clio (best effort) and deletes the stored
/// connection.
///
/// # Response
///
/// - 200 OK: `{ "disconnected": true }`
/// - 404 Not Found: Clio was not connected
async fn disconnect(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<DisconnectResponse>> {
    let integration = clio_integration(&state, user.user_id).await?;

    match state.vault().decrypt(&integration.access_token) {
        Ok(token) => {
            if let Err(e) = state.clio().deauthorize(&token).await {
                tracing::warn!(user_id = %user.user_id, error = %e, "Clio deauthorize failed");
            }
        }
        Err(e) => {
            tracing::warn!(user_id = %user.user_id, error = %e, "Stored Clio token unreadable");
        }
    }

    state
        .store()
        .delete_user_integration(user.user_id, CLIO_PROVIDER)
        .await?;

    tracing::info!(user_id = %user.user_id, "Clio disconnected");
    Ok(Json(DisconnectResponse { disconnected: true }))
}

/// Build Clio OAuth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/clio/oauth/start", get(start))
        .route("/api/clio/oauth/callback", get(callback))
        .route("/api/clio/disconnect", post(disconnect))
}

// ============================================================================
// Tests
// ============================================================================
