//! Clio Manage integration.
//!
//! [`ClioApi`] is the seam between OpenEval logic and Clio's REST API. The
//! resolver and upload pipeline are written against it so tests can swap in
//! an in-memory Clio; [`ClioClient`] is the real `reqwest` implementation.

mod client;
mod error;
pub mod oauth;
pub mod resolver;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use openeval_core::ClioSubjectType;
use url::Url;

pub use client::ClioClient;
pub use error::{ClioError, ClioResult};
pub use types::{
    ClioContact, ClioFolder, ClioSubject, DocumentVersion, DownloadedDocument, TokenResponse,
    UploadFile,
};

/// Default Clio region host.
pub const DEFAULT_CLIO_BASE_URL: &str = "https://app.clio.com";

/// OAuth application credentials and region host.
#[derive(Clone)]
pub struct ClioConfig {
    pub base_url: Url,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl std::fmt::Debug for ClioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClioConfig")
            .field("base_url", &self.base_url.as_str())
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

/// Authenticated Clio resource calls.
///
/// Every method takes a plaintext access token; callers are responsible for
/// unsealing and refreshing it first.
#[async_trait]
pub trait ClioApi: Send + Sync {
    /// Confirm a custom-action nonce by fetching the subject with it.
    ///
    /// Clio answers 403 for a stale or replayed nonce, which maps to
    /// [`ClioError::InvalidNonce`].
    async fn validate_nonce(&self, token: &str, subject_url: &str, nonce: &str)
    -> ClioResult<()>;

    /// Fetch the Matter, Document or Folder behind a custom-action subject URL.
    async fn fetch_subject(
        &self,
        token: &str,
        subject_url: &str,
        kind: ClioSubjectType,
    ) -> ClioResult<ClioSubject>;

    async fn fetch_folder(&self, token: &str, folder_id: i64) -> ClioResult<ClioFolder>;

    async fn fetch_matter(&self, token: &str, matter_id: i64) -> ClioResult<ClioSubject>;

    /// Download a document's latest version along with its display name.
    async fn download_document(
        &self,
        token: &str,
        document_id: i64,
    ) -> ClioResult<DownloadedDocument>;

    /// Create a document under a Matter and upload its bytes. Returns the
    /// new document id.
    async fn create_document(
        &self,
        token: &str,
        matter_id: i64,
        file: &UploadFile,
    ) -> ClioResult<i64>;

    /// Read the UUID of a document's latest version.
    async fn fetch_document_uuid(&self, token: &str, document_id: i64) -> ClioResult<String>;

    /// Mark an uploaded document version as fully uploaded.
    async fn finalize_document(&self, token: &str, document_id: i64, uuid: &str)
    -> ClioResult<()>;
}
