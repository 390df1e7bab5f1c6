//! Clio quote back office: listing, matter assignment and the document
//! bridge between Clio and OpenEval.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::{DateTime, Utc};
use openeval_core::{ClioQuoteStatus, ClioSubjectType};
use openeval_integrations::ClioApi;
use openeval_integrations::clio::UploadFile;
use openeval_integrations::clio::upload::{UploadError, UploadedDocument, upload_evaluation};
use openeval_store::{ClioQuoteRow, StoreResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::clio_session::clio_access_token;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// Multipart field carrying the evaluation file.
const FILE_FIELD: &str = "file";

// ============================================================================
// Request/Response types
// ============================================================================

/// A Clio quote as returned by the API.
#[derive(Debug, Serialize)]
pub struct ClioQuoteResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub clio_subject_id: i64,
    pub clio_subject_type: String,
    pub clio_matter_id: Option<i64>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub subject_description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ClioQuoteRow> for ClioQuoteResponse {
    fn from(row: ClioQuoteRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            clio_subject_id: row.clio_subject_id,
            clio_subject_type: row.clio_subject_type,
            clio_matter_id: row.clio_matter_id,
            client_name: row.client_name,
            client_email: row.client_email,
            subject_description: row.subject_description,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListClioQuotesResponse {
    pub quotes: Vec<ClioQuoteResponse>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListClioQuotesQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListClioQuotesQuery {
    /// Validated `(status, limit, offset)`.
    fn resolve(&self) -> ApiResult<(Option<ClioQuoteStatus>, i64, i64)> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<ClioQuoteStatus>)
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        Ok((status, limit, offset))
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignMatterRequest {
    pub matter_id: i64,
}

#[derive(Debug, Serialize)]
pub struct UploadEvaluationResponse {
    pub quote: ClioQuoteResponse,
    pub clio_document_id: i64,
    pub clio_document_uuid: String,
}

// ============================================================================
// Helpers
// ============================================================================

/// `Content-Disposition` for a download, with an ASCII fallback name and the
/// exact name percent-encoded.
pub fn attachment_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// Load a Clio quote the caller may see.
async fn authorized_quote(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> ApiResult<ClioQuoteRow> {
    let quote = state.store().get_clio_quote(id).await?;
    user.require_self_or_admin(Some(quote.user_id))?;
    Ok(quote)
}

/// First multipart field named `file`, buffered in memory.
async fn read_upload(mut multipart: Multipart) -> ApiResult<UploadFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or("evaluation.pdf")
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
        }
        return Ok(UploadFile {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{}'",
        FILE_FIELD
    )))
}

/// Upload `file` into the quote's matter, then mark the quote completed.
///
/// `mark_completed` runs only after all three Clio steps succeed; any upload
/// failure leaves the quote pending.
pub(crate) async fn complete_evaluation<F, Fut>(
    api: &dyn ClioApi,
    token: &str,
    quote: &ClioQuoteRow,
    file: &UploadFile,
    mark_completed: F,
) -> ApiResult<(ClioQuoteRow, UploadedDocument)>
where
    F: FnOnce(Uuid) -> Fut,
    Fut: Future<Output = StoreResult<ClioQuoteRow>>,
{
    let uploaded = upload_evaluation(api, token, quote.clio_matter_id, file).await?;
    let completed = mark_completed(quote.id).await?;
    Ok((completed, uploaded))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/admin/clio-quotes - List Clio quotes (admin).
///
/// Query: `status` (`pending` | `completed`), `limit` (default 50, max 200),
/// `offset`.
async fn list_clio_quotes(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListClioQuotesQuery>,
) -> ApiResult<Json<ListClioQuotesResponse>> {
    user.require_admin()?;
    let (status, limit, offset) = query.resolve()?;

    let rows = state.store().list_clio_quotes(status, limit, offset).await?;
    Ok(Json(ListClioQuotesResponse {
        quotes: rows.into_iter().map(Into::into).collect(),
        limit,
        offset,
    }))
}

/// GET /api/admin/clio-quotes/{id} - Fetch one Clio quote (owner or admin).
async fn get_clio_quote(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ClioQuoteResponse>> {
    let quote = authorized_quote(&state, &user, id).await?;
    Ok(Json(quote.into()))
}

/// PATCH /api/admin/clio-quotes/{id}/matter - Assign a Clio matter by hand.
///
/// Used when the custom action could not resolve the subject to a matter.
///
/// # Response
///
/// - 200 OK: Updated quote
/// - 400 Bad Request: `matter_id` is not positive
/// - 403 Forbidden: Caller is neither the owner nor an admin
/// - 404 Not Found: Quote doesn't exist
async fn assign_matter(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignMatterRequest>,
) -> ApiResult<Json<ClioQuoteResponse>> {
    if req.matter_id <= 0 {
        return Err(ApiError::BadRequest(
            "matter_id must be a positive integer".to_string(),
        ));
    }
    authorized_quote(&state, &user, id).await?;

    let quote = state.store().assign_clio_matter(id, req.matter_id).await?;
    tracing::info!(quote_id = %id, matter_id = req.matter_id, "Assigned Clio matter");
    Ok(Json(quote.into()))
}

/// GET /api/admin/clio-quotes/{id}/document - Stream the Clio document the
/// quote was created from.
///
/// # Response
///
/// - 200 OK: Document bytes with the upstream content type
/// - 400 Bad Request: The quote's subject is not a document
/// - 404 Not Found: Quote doesn't exist or its owner disconnected Clio
/// - 500 Internal Server Error: Clio download failed
async fn download_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let quote = authorized_quote(&state, &user, id).await?;
    let subject_type = quote
        .subject_type()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if subject_type != ClioSubjectType::Document {
        return Err(ApiError::BadRequest(format!(
            "Quote subject is a {}, not a Document",
            subject_type
        )));
    }

    let token = clio_access_token(&state, quote.user_id).await?;
    let document = state
        .clio()
        .download_document(&token, quote.clio_subject_id)
        .await?;

    tracing::info!(
        quote_id = %id,
        document_id = quote.clio_subject_id,
        bytes = document.bytes.len(),
        "Downloaded Clio document"
    );

    let content_type = HeaderValue::from_str(&document.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&attachment_disposition(&document.filename))
        .map_err(|e| ApiError::Internal(format!("Invalid filename header: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

/// POST /api/admin/clio-quotes/{id}/evaluation - Upload the finished
/// evaluation into the quote's Clio matter.
///
/// # Response
///
/// - 200 OK: Quote marked completed, with the new Clio document id
/// - 400 Bad Request: No matter assigned, or no `file` part
/// - 404 Not Found: Quote doesn't exist or its owner disconnected Clio
/// - 500 Internal Server Error: A Clio upload step failed; the quote stays pending
async fn upload_evaluation_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<UploadEvaluationResponse>> {
    let quote = authorized_quote(&state, &user, id).await?;
    if quote.clio_matter_id.is_none() {
        return Err(UploadError::MissingMatter.into());
    }

    let file = read_upload(multipart).await?;
    let token = clio_access_token(&state, quote.user_id).await?;
    let (quote, uploaded) = complete_evaluation(state.clio(), &token, &quote, &file, |id| {
        state.store().mark_clio_quote_completed(id)
    })
    .await?;
    tracing::info!(
        quote_id = %id,
        document_id = uploaded.document_id,
        "Evaluation uploaded to Clio"
    );

    Ok(Json(UploadEvaluationResponse {
        quote: quote.into(),
        clio_document_id: uploaded.document_id,
        clio_document_uuid: uploaded.uuid,
    }))
}

/// Build Clio quote routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/clio-quotes", get(list_clio_quotes))
        .route("/api/admin/clio-quotes/{id}", get(get_clio_quote))
        .route("/api/admin/clio-quotes/{id}/matter", patch(assign_matter))
        .route("/api/admin/clio-quotes/{id}/document", get(download_document))
        .route(
            "/api/admin/clio-quotes/{id}/evaluation",
            post(upload_evaluation_handler),
        )
}
