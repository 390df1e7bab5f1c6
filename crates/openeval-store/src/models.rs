//! Database models for the storage layer.
//!
//! These types map directly to database rows and are used for sqlx
//! queries. Enum-valued columns are kept as `String` on the row and parsed
//! on access, so a row with an unexpected value can still be loaded and
//! reported.

use chrono::{DateTime, Utc};
use openeval_core::api_key::StoredApiKey;
use openeval_core::{ClioQuoteStatus, ClioSubjectType, QuoteSource, QuoteStatus, ServiceType};
use sqlx::FromRow;
use uuid::Uuid;

/// Integration name used for Clio rows in `user_integrations` and
/// `oauth_states`.
pub const CLIO_PROVIDER: &str = "clio";

// ============================================================================
// Profiles
// ============================================================================

/// Database row for the `profiles` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// OAuth
// ============================================================================

/// Database row for the `oauth_states` table.
#[derive(Debug, Clone, FromRow)]
pub struct OAuthStateRow {
    pub state: String,
    pub user_id: Uuid,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

/// Database row for the `user_integrations` table.
///
/// `access_token` and `refresh_token` hold token-vault envelopes, never
/// plaintext.
#[derive(Clone, FromRow)]
pub struct UserIntegrationRow {
    pub user_id: Uuid,
    pub integration_name: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub integration_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserIntegrationRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserIntegrationRow")
            .field("user_id", &self.user_id)
            .field("integration_name", &self.integration_name)
            .field("expires_at", &self.expires_at)
            .field("integration_user_id", &self.integration_user_id)
            .finish_non_exhaustive()
    }
}

/// Input for upserting a `user_integrations` row.
#[derive(Clone)]
pub struct NewUserIntegration {
    pub user_id: Uuid,
    pub integration_name: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub integration_user_id: Option<String>,
}

// ============================================================================
// Clio quotes
// ============================================================================

/// Database row for the `clio_quotes` table.
#[derive(Debug, Clone, FromRow)]
pub struct ClioQuoteRow {
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

impl ClioQuoteRow {
    pub fn subject_type(&self) -> Result<ClioSubjectType, openeval_core::ParseEnumError> {
        self.clio_subject_type.parse()
    }

    pub fn status(&self) -> Result<ClioQuoteStatus, openeval_core::ParseEnumError> {
        self.status.parse()
    }
}

/// Input for inserting a `clio_quotes` row.
#[derive(Debug, Clone)]
pub struct NewClioQuote {
    pub user_id: Uuid,
    pub clio_subject_id: i64,
    pub clio_subject_type: ClioSubjectType,
    pub clio_matter_id: Option<i64>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub subject_description: Option<String>,
}

// ============================================================================
// API keys
// ============================================================================

/// Database row for the `api_keys` table.
#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub hashed_key: String,
    pub key_prefix: String,
    pub revoked: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl StoredApiKey for ApiKeyRow {
    fn hashed_key(&self) -> &str {
        &self.hashed_key
    }

    fn is_revoked(&self) -> bool {
        self.revoked
    }
}

/// Input for inserting an `api_keys` row.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub user_id: Uuid,
    pub name: String,
    pub hashed_key: String,
    pub key_prefix: String,
}

// ============================================================================
// Quotes
// ============================================================================

/// Database row for the `quotes` table.
#[derive(Debug, Clone, FromRow)]
pub struct QuoteRow {
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

impl QuoteRow {
    pub fn source(&self) -> Result<QuoteSource, openeval_core::ParseEnumError> {
        self.source.parse()
    }

    pub fn service_type(&self) -> Result<ServiceType, openeval_core::ParseEnumError> {
        self.service_type.parse()
    }

    pub fn status(&self) -> Result<QuoteStatus, openeval_core::ParseEnumError> {
        self.status.parse()
    }
}

/// Input for inserting a `quotes` row.
#[derive(Debug, Clone)]
pub struct NewQuote {
    pub user_id: Option<Uuid>,
    pub source: QuoteSource,
    pub client_name: String,
    pub client_email: String,
    pub service_type: ServiceType,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub notes: Option<String>,
}
