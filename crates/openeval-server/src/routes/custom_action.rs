//! GET /api/clio/custom-action - Landing point for the Clio "Request OpenEval
//! Quote" button.
//!
//! Clio opens this URL with the Clio user id, the subject URL and a one-time
//! nonce. We find the connected OpenEval user, resolve the subject to a
//! Matter, record a Clio quote and send the browser to the quote page.

use axum::{
    Router,
    extract::{Query, State},
    response::Response,
    routing::get,
};
use openeval_integrations::clio::resolver::resolve_custom_action;
use openeval_store::{CLIO_PROVIDER, NewClioQuote};
use serde::Deserialize;

use crate::clio_session::access_token_for;
use crate::error::{ApiError, ApiResult};
use crate::routes::found;
use crate::state::AppState;

/// Query string Clio attaches to the custom action URL.
#[derive(Debug, Default, Deserialize)]
pub struct CustomActionParams {
    /// Clio user id of whoever clicked the action.
    pub user_id: Option<String>,
    pub subject_url: Option<String>,
    pub custom_action_nonce: Option<String>,
}

/// Pull the three required parameters, or say which one is missing.
pub fn required_params(params: CustomActionParams) -> ApiResult<(String, String, String)> {
    let take = |value: Option<String>, name: &str| {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest(format!("Missing {}", name)))
    };
    Ok((
        take(params.user_id, "user_id")?,
        take(params.subject_url, "subject_url")?,
        take(params.custom_action_nonce, "custom_action_nonce")?,
    ))
}

/// GET /api/clio/custom-action - Create a Clio quote from a custom action.
///
/// # Response
///
/// - 302 Found: to `{APP_BASE_URL}/clio/quotes/{id}`
/// - 400 Bad Request: Missing parameters or unsupported subject URL
/// - 403 Forbidden: Clio rejected the nonce
/// - 404 Not Found: No OpenEval user is connected to this Clio user
/// - 500 Internal Server Error: A Clio fetch failed; no quote is created
async fn custom_action(
    State(state): State<AppState>,
    Query(params): Query<CustomActionParams>,
) -> ApiResult<Response> {
    let (clio_user_id, subject_url, nonce) = required_params(params)?;

    let integration = state
        .store()
        .find_integration_by_provider_user(CLIO_PROVIDER, &clio_user_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("No OpenEval account is connected to this Clio user".to_string())
        })?;

    let token = access_token_for(&state, &integration).await?;
    let resolved = resolve_custom_action(state.clio(), &token, &subject_url, &nonce).await?;

    let quote = state
        .store()
        .insert_clio_quote(&NewClioQuote {
            user_id: integration.user_id,
            clio_subject_id: resolved.subject_id,
            clio_subject_type: resolved.subject_type,
            clio_matter_id: resolved.matter_id,
            client_name: resolved.client_name,
            client_email: resolved.client_email,
            subject_description: resolved.description,
        })
        .await?;

    tracing::info!(
        quote_id = %quote.id,
        user_id = %integration.user_id,
        subject_type = %resolved.subject_type,
        matter_id = ?resolved.matter_id,
        "Clio quote created from custom action"
    );

    Ok(found(&format!(
        "{}/clio/quotes/{}",
        state.config().app_base_url,
        quote.id
    )))
}

/// Build custom action routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/clio/custom-action", get(custom_action))
}
