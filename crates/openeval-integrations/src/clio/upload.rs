//! Three-step evaluation upload into a Clio Matter.
//!
//! 1. `POST /api/v4/documents.json` with the file → document id
//! 2. `GET` the document's latest version → UUID
//! 3. `PATCH` the document with `{uuid, fully_uploaded: true}`
//!
//! The steps are not atomic. A failure aborts the remaining steps and nothing
//! is rolled back at Clio.

use std::fmt;

use thiserror::Error;

use super::{ClioApi, ClioError, UploadFile};

/// Message shown when an upload is attempted before a Matter is known.
pub const MISSING_MATTER_MESSAGE: &str = "No Clio Matter ID is assigned to this quote. \
     Assign a matter before uploading the evaluation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    Create,
    FetchUuid,
    Finalize,
}

impl fmt::Display for UploadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UploadStep::Create => "creating the document",
            UploadStep::FetchUuid => "reading the document version",
            UploadStep::Finalize => "finalizing the upload",
        })
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("{}", MISSING_MATTER_MESSAGE)]
    MissingMatter,

    #[error("Clio upload failed while {step}: {source}")]
    Step {
        step: UploadStep,
        #[source]
        source: ClioError,
    },
}

/// A fully uploaded Clio document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub document_id: i64,
    pub uuid: String,
}

/// Upload `file` into the Matter `matter_id`.
///
/// Refuses with [`UploadError::MissingMatter`] before touching Clio when no
/// Matter is assigned.
pub async fn upload_evaluation(
    api: &dyn ClioApi,
    token: &str,
    matter_id: Option<i64>,
    file: &UploadFile,
) -> Result<UploadedDocument, UploadError> {
    let matter_id = matter_id.ok_or(UploadError::MissingMatter)?;

    let document_id = api
        .create_document(token, matter_id, file)
        .await
        .map_err(|source| UploadError::Step {
            step: UploadStep::Create,
            source,
        })?;
    tracing::debug!(matter_id, document_id, "Clio document created");

    let uuid = api
        .fetch_document_uuid(token, document_id)
        .await
        .map_err(|source| UploadError::Step {
            step: UploadStep::FetchUuid,
            source,
        })?;

    api.finalize_document(token, document_id, &uuid)
        .await
        .map_err(|source| UploadError::Step {
            step: UploadStep::Finalize,
            source,
        })?;

    tracing::info!(
        matter_id,
        document_id,
        filename = %file.filename,
        size = file.bytes.len(),
        "Evaluation uploaded to Clio"
    );
    Ok(UploadedDocument { document_id, uuid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clio::fake::FakeClio;

    fn file() -> UploadFile {
        UploadFile {
            filename: "evaluation.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.7 evaluation".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let fake = FakeClio::new();

        let uploaded = upload_evaluation(&fake, "t", Some(9), &file()).await.unwrap();
        assert_eq!(uploaded.document_id, 9001);
        assert_eq!(uploaded.uuid, "uuid-9001");
        assert_eq!(
            fake.calls(),
            vec![
                "create_document:9:evaluation.pdf".to_string(),
                "fetch_document_uuid:9001".to_string(),
                "finalize_document:9001:uuid-9001".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_matter_makes_no_calls() {
        let fake = FakeClio::new();

        let err = upload_evaluation(&fake, "t", None, &file()).await.unwrap_err();
        assert!(matches!(err, UploadError::MissingMatter));
        assert!(err.to_string().starts_with("No Clio Matter ID is assigned"));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_create_aborts() {
        let mut fake = FakeClio::new();
        fake.fail_on = Some("create_document");

        let err = upload_evaluation(&fake, "t", Some(9), &file()).await.unwrap_err();
        assert!(matches!(
            err,
            UploadError::Step {
                step: UploadStep::Create,
                ..
            }
        ));
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_finalize_surfaces_provider_message() {
        let mut fake = FakeClio::new();
        fake.fail_on = Some("finalize_document");

        let err = upload_evaluation(&fake, "t", Some(9), &file()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("finalizing the upload"));
        assert!(message.contains("finalize_document rejected"));
        assert_eq!(fake.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_uuid_fetch_skips_finalize() {
        let mut fake = FakeClio::new();
        fake.fail_on = Some("fetch_document_uuid");

        let err = upload_evaluation(&fake, "t", Some(9), &file()).await.unwrap_err();
        assert!(matches!(
            err,
            UploadError::Step {
                step: UploadStep::FetchUuid,
                ..
            }
        ));
        assert!(err.to_string().contains("reading the document version"));
        assert_eq!(
            fake.calls(),
            vec![
                "create_document:9:evaluation.pdf".to_string(),
                "fetch_document_uuid:9001".to_string(),
            ]
        );
    }
}
