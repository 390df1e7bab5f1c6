//! Wire and value types for the Clio API.

use chrono::{DateTime, Duration, Utc};
use openeval_core::{ClioSubjectType, ParentRef};
use serde::Deserialize;

/// Clio wraps every resource in `{"data": ...}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// Response from `POST /oauth/token`.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in.map(|secs| now + Duration::seconds(secs))
    }
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

/// Contact attached to a Matter as its client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClioContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primary_email_address: Option<String>,
}

/// A Matter, Document or Folder as returned by a subject fetch.
///
/// Only the fields relevant to `kind` are populated: Matters carry
/// `display_number`, `description` and `client`; Documents and Folders carry
/// `name` and `parent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClioSubject {
    pub id: i64,
    pub kind: ClioSubjectType,
    pub name: Option<String>,
    pub display_number: Option<String>,
    pub description: Option<String>,
    pub parent: Option<ParentRef>,
    pub client: Option<ClioContact>,
}

impl ClioSubject {
    /// Short human label stored on the quote.
    pub fn label(&self) -> Option<String> {
        match self.kind {
            ClioSubjectType::Matter => match (&self.display_number, &self.description) {
                (Some(number), Some(desc)) if !desc.is_empty() => {
                    Some(format!("{} - {}", number, desc))
                }
                (Some(number), _) => Some(number.clone()),
                (None, desc) => desc.clone(),
            },
            ClioSubjectType::Document | ClioSubjectType::Folder => self.name.clone(),
        }
    }
}

/// Raw subject payload, before it is tagged with its kind.
#[derive(Debug, Deserialize)]
pub(crate) struct SubjectPayload {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent: Option<ParentRef>,
    #[serde(default)]
    pub client: Option<ClioContact>,
}

impl SubjectPayload {
    pub fn into_subject(self, kind: ClioSubjectType) -> ClioSubject {
        ClioSubject {
            id: self.id,
            kind,
            name: self.name,
            display_number: self.display_number,
            description: self.description,
            parent: self.parent,
            client: self.client,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClioFolder {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent: Option<ParentRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentVersion {
    pub uuid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentPayload {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub latest_document_version: Option<DocumentVersion>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserPayload {
    pub id: i64,
}

/// Bytes of a downloaded Clio document.
#[derive(Debug, Clone)]
pub struct DownloadedDocument {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A file to upload into Clio.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_parses_and_hides_tokens() {
        let json = r#"{"access_token":"at-1","refresh_token":"rt-1","expires_in":604800,"token_type":"bearer"}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "at-1");

        let now = Utc::now();
        assert_eq!(token.expires_at(now), Some(now + Duration::days(7)));

        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("at-1"));
        assert!(!rendered.contains("rt-1"));
    }

    #[test]
    fn test_token_response_without_refresh() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token":"at"}"#).unwrap();
        assert!(token.refresh_token.is_none());
        assert!(token.expires_at(Utc::now()).is_none());
    }

    #[test]
    fn test_document_subject_parses_parent() {
        let json = r#"{"data":{"id":77,"name":"diploma.pdf","parent":{"id":5,"type":"Folder"}}}"#;
        let payload: Envelope<SubjectPayload> = serde_json::from_str(json).unwrap();
        let subject = payload.data.into_subject(ClioSubjectType::Document);
        assert_eq!(subject.parent, Some(ParentRef::new(5, "Folder")));
        assert_eq!(subject.label().as_deref(), Some("diploma.pdf"));
    }

    #[test]
    fn test_matter_label() {
        let json = r#"{"data":{"id":9,"display_number":"00012-Smith","description":"Credential review","client":{"name":"Ana Smith","primary_email_address":"ana@example.com"}}}"#;
        let payload: Envelope<SubjectPayload> = serde_json::from_str(json).unwrap();
        let subject = payload.data.into_subject(ClioSubjectType::Matter);
        assert_eq!(
            subject.label().as_deref(),
            Some("00012-Smith - Credential review")
        );
        assert_eq!(
            subject.client.unwrap().primary_email_address.as_deref(),
            Some("ana@example.com")
        );
    }
}
