//! `reqwest` implementation of [`ClioApi`].

use async_trait::async_trait;
use openeval_core::ClioSubjectType;
use reqwest::{Response, StatusCode, multipart};
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use super::types::{DocumentPayload, Envelope, SubjectPayload};
use super::{
    ClioApi, ClioConfig, ClioError, ClioFolder, ClioResult, ClioSubject, DownloadedDocument,
    UploadFile,
};
use crate::http::{build_http_client, provider_error_message};

const MATTER_FIELDS: &str = "id,display_number,description,client{name,primary_email_address}";
const NODE_FIELDS: &str = "id,name,parent{id,type}";
const DOCUMENT_VERSION_FIELDS: &str = "id,latest_document_version{uuid}";

/// Client for a single Clio region.
#[derive(Clone, Debug)]
pub struct ClioClient {
    http: reqwest::Client,
    config: ClioConfig,
}

impl ClioClient {
    pub fn new(config: ClioConfig) -> ClioResult<Self> {
        Ok(Self::with_http(config, build_http_client()?))
    }

    /// Use an existing `reqwest` client (shared connection pool).
    pub fn with_http(config: ClioConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClioConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn url(&self, path: &str) -> ClioResult<Url> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| ClioError::UnexpectedResponse(format!("bad Clio URL {}: {}", path, e)))
    }

    pub(crate) async fn json<T: DeserializeOwned>(response: Response) -> ClioResult<T> {
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Turn a non-2xx response into [`ClioError::Api`] carrying Clio's message.
    pub(crate) async fn check(response: Response) -> ClioResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClioError::Api {
            status: status.as_u16(),
            message: provider_error_message(&body),
        })
    }
}

/// Resolve a custom-action subject URL against the Clio host.
///
/// Relative paths are joined onto `base`. Absolute URLs must use the same
/// scheme and host as `base`; anything else would leak the access token to a
/// third party.
pub fn resolve_subject_url(base: &Url, subject_url: &str) -> ClioResult<Url> {
    let subject_url = subject_url.trim();
    if subject_url.is_empty() {
        return Err(ClioError::InvalidSubjectUrl("empty".to_string()));
    }

    if subject_url.starts_with('/') {
        return base
            .join(subject_url)
            .map_err(|e| ClioError::InvalidSubjectUrl(format!("{}: {}", subject_url, e)));
    }

    let url = Url::parse(subject_url)
        .map_err(|e| ClioError::InvalidSubjectUrl(format!("{}: {}", subject_url, e)))?;
    if url.scheme() != base.scheme()
        || url.host_str() != base.host_str()
        || url.port_or_known_default() != base.port_or_known_default()
    {
        return Err(ClioError::InvalidSubjectUrl(format!(
            "{} is not on {}",
            subject_url,
            base.host_str().unwrap_or_default()
        )));
    }
    Ok(url)
}

fn fields_for(kind: ClioSubjectType) -> &'static str {
    match kind {
        ClioSubjectType::Matter => MATTER_FIELDS,
        ClioSubjectType::Document | ClioSubjectType::Folder => NODE_FIELDS,
    }
}

/// Pick a filename from `Content-Disposition`, if present.
fn disposition_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

#[async_trait]
impl ClioApi for ClioClient {
    async fn validate_nonce(
        &self,
        token: &str,
        subject_url: &str,
        nonce: &str,
    ) -> ClioResult<()> {
        let url = resolve_subject_url(&self.config.base_url, subject_url)?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("custom_action_nonce", nonce)])
            .send()
            .await?;

        if response.status() == StatusCode::FORBIDDEN {
            tracing::warn!("Clio rejected custom action nonce");
            return Err(ClioError::InvalidNonce);
        }
        Self::check(response).await?;
        Ok(())
    }

    async fn fetch_subject(
        &self,
        token: &str,
        subject_url: &str,
        kind: ClioSubjectType,
    ) -> ClioResult<ClioSubject> {
        let url = resolve_subject_url(&self.config.base_url, subject_url)?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", fields_for(kind))])
            .send()
            .await?;
        let payload: Envelope<SubjectPayload> = Self::json(response).await?;
        Ok(payload.data.into_subject(kind))
    }

    async fn fetch_folder(&self, token: &str, folder_id: i64) -> ClioResult<ClioFolder> {
        let url = self.url(&format!("/api/v4/folders/{}.json", folder_id))?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", NODE_FIELDS)])
            .send()
            .await?;
        let payload: Envelope<ClioFolder> = Self::json(response).await?;
        Ok(payload.data)
    }

    async fn fetch_matter(&self, token: &str, matter_id: i64) -> ClioResult<ClioSubject> {
        let url = self.url(&format!("/api/v4/matters/{}.json", matter_id))?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", MATTER_FIELDS)])
            .send()
            .await?;
        let payload: Envelope<SubjectPayload> = Self::json(response).await?;
        Ok(payload.data.into_subject(ClioSubjectType::Matter))
    }

    async fn download_document(
        &self,
        token: &str,
        document_id: i64,
    ) -> ClioResult<DownloadedDocument> {
        let meta_url = self.url(&format!("/api/v4/documents/{}.json", document_id))?;
        let response = self
            .http
            .get(meta_url)
            .bearer_auth(token)
            .query(&[("fields", "id,name")])
            .send()
            .await?;
        let meta: Envelope<DocumentPayload> = Self::json(response).await?;

        let url = self.url(&format!("/api/v4/documents/{}/download", document_id))?;
        let response = Self::check(self.http.get(url).bearer_auth(token).send().await?).await?;

        let headers = response.headers();
        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let filename = meta
            .data
            .name
            .or_else(|| {
                headers
                    .get(reqwest::header::CONTENT_DISPOSITION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(disposition_filename)
            })
            .unwrap_or_else(|| format!("document-{}", document_id));
        let bytes = response.bytes().await?.to_vec();

        tracing::debug!(document_id, size = bytes.len(), "Downloaded Clio document");
        Ok(DownloadedDocument {
            filename,
            content_type,
            bytes,
        })
    }

    async fn create_document(
        &self,
        token: &str,
        matter_id: i64,
        file: &UploadFile,
    ) -> ClioResult<i64> {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.content_type)?;
        let form = multipart::Form::new()
            .text("data[name]", file.filename.clone())
            .text("data[parent][id]", matter_id.to_string())
            .text("data[parent][type]", "Matter")
            .part("file", part);

        let url = self.url("/api/v4/documents.json")?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        let payload: Envelope<DocumentPayload> = Self::json(response).await?;
        Ok(payload.data.id)
    }

    async fn fetch_document_uuid(&self, token: &str, document_id: i64) -> ClioResult<String> {
        let url = self.url(&format!("/api/v4/documents/{}.json", document_id))?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", DOCUMENT_VERSION_FIELDS)])
            .send()
            .await?;
        let payload: Envelope<DocumentPayload> = Self::json(response).await?;
        payload
            .data
            .latest_document_version
            .map(|version| version.uuid)
            .ok_or_else(|| {
                ClioError::UnexpectedResponse(format!(
                    "document {} has no latest_document_version",
                    document_id
                ))
            })
    }

    async fn finalize_document(
        &self,
        token: &str,
        document_id: i64,
        uuid: &str,
    ) -> ClioResult<()> {
        let url = self.url(&format!("/api/v4/documents/{}.json", document_id))?;
        let response = self
            .http
            .patch(url)
            .bearer_auth(token)
            .json(&json!({ "data": { "uuid": uuid, "fully_uploaded": true } }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://app.clio.com").unwrap()
    }

    #[test]
    fn test_relative_subject_url_is_joined() {
        let url = resolve_subject_url(&base(), "/api/v4/documents/77").unwrap();
        assert_eq!(url.as_str(), "https://app.clio.com/api/v4/documents/77");
    }

    #[test]
    fn test_absolute_subject_url_on_clio_host() {
        let url =
            resolve_subject_url(&base(), "https://app.clio.com/api/v4/matters/9.json").unwrap();
        assert_eq!(url.path(), "/api/v4/matters/9.json");
    }

    #[test]
    fn test_foreign_host_is_rejected() {
        let err = resolve_subject_url(&base(), "https://evil.example/api/v4/matters/9").unwrap_err();
        assert!(matches!(err, ClioError::InvalidSubjectUrl(_)));

        let err = resolve_subject_url(&base(), "http://app.clio.com/api/v4/matters/9").unwrap_err();
        assert!(matches!(err, ClioError::InvalidSubjectUrl(_)));
    }

    #[test]
    fn test_garbage_subject_url_is_rejected() {
        assert!(resolve_subject_url(&base(), "").is_err());
        assert!(resolve_subject_url(&base(), "matters/9").is_err());
    }

    #[test]
    fn test_fields_per_subject_kind() {
        assert!(fields_for(ClioSubjectType::Matter).contains("client{"));
        assert!(fields_for(ClioSubjectType::Folder).contains("parent{"));
        assert!(fields_for(ClioSubjectType::Document).contains("parent{"));
    }

    #[test]
    fn test_disposition_filename() {
        assert_eq!(
            disposition_filename(r#"attachment; filename="diploma.pdf""#).as_deref(),
            Some("diploma.pdf")
        );
        assert_eq!(disposition_filename("inline"), None);
    }
}
