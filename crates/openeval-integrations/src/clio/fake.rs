//! In-memory Clio for resolver and upload tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use openeval_core::{ClioSubjectType, ParentRef};

use super::{
    ClioApi, ClioContact, ClioError, ClioFolder, ClioResult, ClioSubject, DownloadedDocument,
    UploadFile,
};

#[derive(Default)]
pub(crate) struct FakeClio {
    pub subjects: HashMap<String, ClioSubject>,
    pub folders: HashMap<i64, ClioFolder>,
    pub matters: HashMap<i64, ClioSubject>,
    pub reject_nonce: bool,
    /// Name of a call that should fail with a 422.
    pub fail_on: Option<&'static str>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeClio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(mut self, id: i64, parent: Option<ParentRef>) -> Self {
        self.folders.insert(
            id,
            ClioFolder {
                id,
                name: Some(format!("folder-{}", id)),
                parent,
            },
        );
        self
    }

    pub fn with_matter(mut self, id: i64, client_name: &str, client_email: &str) -> Self {
        self.matters.insert(id, matter(id, client_name, client_email));
        self
    }

    pub fn with_subject(mut self, url: &str, subject: ClioSubject) -> Self {
        self.subjects.insert(url.to_string(), subject);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn folder_fetches(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with("fetch_folder"))
            .count()
    }

    fn record(&self, call: String) -> ClioResult<()> {
        let name = call.split(':').next().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(call);
        if self.fail_on == Some(name.as_str()) {
            return Err(ClioError::Api {
                status: 422,
                message: format!("{} rejected", name),
            });
        }
        Ok(())
    }
}

pub(crate) fn matter(id: i64, client_name: &str, client_email: &str) -> ClioSubject {
    ClioSubject {
        id,
        kind: ClioSubjectType::Matter,
        name: None,
        display_number: Some(format!("{:05}-Client", id)),
        description: Some("Credential evaluation".to_string()),
        parent: None,
        client: Some(ClioContact {
            name: Some(client_name.to_string()),
            primary_email_address: Some(client_email.to_string()),
        }),
    }
}

pub(crate) fn node(id: i64, kind: ClioSubjectType, parent: Option<ParentRef>) -> ClioSubject {
    ClioSubject {
        id,
        kind,
        name: Some(format!("node-{}.pdf", id)),
        display_number: None,
        description: None,
        parent,
        client: None,
    }
}

#[async_trait]
impl ClioApi for FakeClio {
    async fn validate_nonce(
        &self,
        _token: &str,
        subject_url: &str,
        nonce: &str,
    ) -> ClioResult<()> {
        self.record(format!("validate_nonce:{}:{}", subject_url, nonce))?;
        if self.reject_nonce {
            return Err(ClioError::InvalidNonce);
        }
        Ok(())
    }

    async fn fetch_subject(
        &self,
        _token: &str,
        subject_url: &str,
        _kind: ClioSubjectType,
    ) -> ClioResult<ClioSubject> {
        self.record(format!("fetch_subject:{}", subject_url))?;
        self.subjects
            .get(subject_url)
            .cloned()
            .ok_or_else(|| ClioError::Api {
                status: 404,
                message: "subject not found".to_string(),
            })
    }

    async fn fetch_folder(&self, _token: &str, folder_id: i64) -> ClioResult<ClioFolder> {
        self.record(format!("fetch_folder:{}", folder_id))?;
        self.folders
            .get(&folder_id)
            .cloned()
            .ok_or_else(|| ClioError::Api {
                status: 404,
                message: format!("folder {} not found", folder_id),
            })
    }

    async fn fetch_matter(&self, _token: &str, matter_id: i64) -> ClioResult<ClioSubject> {
        self.record(format!("fetch_matter:{}", matter_id))?;
        self.matters
            .get(&matter_id)
            .cloned()
            .ok_or_else(|| ClioError::Api {
                status: 404,
                message: format!("matter {} not found", matter_id),
            })
    }

    async fn download_document(
        &self,
        _token: &str,
        document_id: i64,
    ) -> ClioResult<DownloadedDocument> {
        self.record(format!("download_document:{}", document_id))?;
        Ok(DownloadedDocument {
            filename: format!("document-{}.pdf", document_id),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.7".to_vec(),
        })
    }

    async fn create_document(
        &self,
        _token: &str,
        matter_id: i64,
        file: &UploadFile,
    ) -> ClioResult<i64> {
        self.record(format!("create_document:{}:{}", matter_id, file.filename))?;
        Ok(9001)
    }

    async fn fetch_document_uuid(&self, _token: &str, document_id: i64) -> ClioResult<String> {
        self.record(format!("fetch_document_uuid:{}", document_id))?;
        Ok("uuid-9001".to_string())
    }

    async fn finalize_document(
        &self,
        _token: &str,
        document_id: i64,
        uuid: &str,
    ) -> ClioResult<()> {
        self.record(format!("finalize_document:{}:{}", document_id, uuid))
    }
}
