//! Quote requests from the web checkout and from API-key clients, plus the
//! back-office actions on them.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{patch, post},
};
use chrono::{DateTime, Utc};
use openeval_core::{QuoteSource, ServiceType};
use openeval_store::{NewQuote, QuoteRow};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::emails::{notify_admin, quote_confirmation};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiKeyIdentity;
use crate::state::AppState;

const MAX_NOTES_LEN: usize = 5_000;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateQuoteRequest {
    pub client_name: String,
    pub client_email: String,
    pub service_type: ServiceType,
    #[serde(default)]
    pub source_language: Option<String>,
    #[serde(default)]
    pub target_language: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateQuoteRequest {
    /// Validate and normalize into a row for `user_id` from `source`.
    pub fn into_new_quote(self, user_id: Uuid, source: QuoteSource) -> ApiResult<NewQuote> {
        let client_name = self.client_name.trim().to_string();
        if client_name.is_empty() {
            return Err(ApiError::BadRequest("client_name is required".to_string()));
        }
        let client_email = self.client_email.trim().to_string();
        if !looks_like_email(&client_email) {
            return Err(ApiError::BadRequest(
                "client_email must be a valid email address".to_string(),
            ));
        }
        let notes = non_blank(self.notes);
        if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
            return Err(ApiError::BadRequest(format!(
                "notes must be at most {} characters",
                MAX_NOTES_LEN
            )));
        }

        Ok(NewQuote {
            user_id: Some(user_id),
            source,
            client_name,
            client_email,
            service_type: self.service_type,
            source_language: non_blank(self.source_language),
            target_language: non_blank(self.target_language),
            notes,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub source: String,
    pub client_name: String,
    pub client_email: String,
    pub service_type: String,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub amount_cents: Option<i64>,
    pub invoice_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<QuoteRow> for QuoteResponse {
    fn from(row: QuoteRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            source: row.source,
            client_name: row.client_name,
            client_email: row.client_email,
            service_type: row.service_type,
            source_language: row.source_language,
            target_language: row.target_language,
            notes: row.notes,
            status: row.status,
            amount_cents: row.amount_cents,
            invoice_id: row.invoice_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LinkInvoiceRequest {
    pub invoice_id: String,
}

#[derive(Debug, Serialize)]
pub struct EmailSentResponse {
    pub email_id: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Loose shape check: one `@`, something before it, a dotted domain after.
pub fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

// ============================================================================
// Handlers
// ============================================================================

async fn create_quote(
    state: &AppState,
    user_id: Uuid,
    source: QuoteSource,
    req: CreateQuoteRequest,
) -> ApiResult<(StatusCode, Json<QuoteResponse>)> {
    let new_quote = req.into_new_quote(user_id, source)?;
    let quote = state.store().insert_quote(&new_quote).await?;

    tracing::info!(
        quote_id = %quote.id,
        user_id = %user_id,
        source = %source,
        "Quote request received"
    );
    notify_admin(state, &quote).await;

    Ok((StatusCode::CREATED, Json(quote.into())))
}

/// POST /api/v1/quote-requests - Quote ingestion for API-key clients.
///
/// # Response
///
/// - 201 Created: The new quote
/// - 400 Bad Request: Missing name or invalid email
/// - 401 Unauthorized: Missing, malformed or unknown API key
/// - 403 Forbidden: Revoked API key
async fn create_api_quote(
    State(state): State<AppState>,
    identity: ApiKeyIdentity,
    Json(req): Json<CreateQuoteRequest>,
) -> ApiResult<(StatusCode, Json<QuoteResponse>)> {
    create_quote(&state, identity.user_id, QuoteSource::Api, req).await
}

/// POST /api/quote-requests - Quote request from the signed-in web checkout.
async fn create_web_quote(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateQuoteRequest>,
) -> ApiResult<(StatusCode, Json<QuoteResponse>)> {
    create_quote(&state, user.user_id, QuoteSource::Web, req).await
}

/// POST /api/quotes/{id}/confirmation-email - Email the client a
/// confirmation (owner or admin).
///
/// # Response
///
/// - 200 OK: Provider message id
/// - 404 Not Found: Quote doesn't exist
/// - 500 Internal Server Error: Email not configured, or the provider refused
async fn send_confirmation_email(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EmailSentResponse>> {
    let quote = state.store().get_quote(id).await?;
    user.require_self_or_admin(quote.user_id)?;

    let resend = state.resend().ok_or(ApiError::NotConfigured("Email"))?;
    let email_id = resend.send(&quote_confirmation(&quote)).await?;

    tracing::info!(quote_id = %id, email_id = %email_id, "Sent quote confirmation email");
    Ok(Json(EmailSentResponse { email_id }))
}

/// PATCH /api/admin/quotes/{id}/invoice - Link an Invoiced invoice (admin).
async fn link_invoice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<LinkInvoiceRequest>,
) -> ApiResult<Json<QuoteResponse>> {
    user.require_admin()?;
    let invoice_id = req.invoice_id.trim();
    if invoice_id.is_empty() {
        return Err(ApiError::BadRequest("invoice_id is required".to_string()));
    }

    let quote = state.store().set_quote_invoice(id, invoice_id).await?;
    tracing::info!(quote_id = %id, invoice_id, "Linked invoice to quote");
    Ok(Json(quote.into()))
}

/// Build quote routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/quote-requests", post(create_api_quote))
        .route("/api/quote-requests", post(create_web_quote))
        .route(
            "/api/quotes/{id}/confirmation-email",
            post(send_confirmation_email),
        )
        .route("/api/admin/quotes/{id}/invoice", patch(link_invoice))
}
