//! Custom-action resolution: from a Clio subject URL to the quote fields.
//!
//! Documents and Folders can sit several folders deep under a Matter. The
//! walk up the folder tree is iterative and bounded by [`MAX_FOLDER_DEPTH`]
//! folder fetches, so a cyclic or very deep tree ends in "no matter" rather
//! than an unbounded number of API calls.

use openeval_core::{ClioSubjectType, ParentRef};

use super::{ClioApi, ClioError, ClioResult, ClioSubject};

/// Maximum number of folder fetches while looking for a Matter.
pub const MAX_FOLDER_DEPTH: usize = 5;

/// Outcome of a Folder→Matter walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatterResolution {
    pub matter_id: Option<i64>,
    /// Folder fetches made during the walk.
    pub folders_visited: usize,
}

/// Walk up from `parent` to the nearest Matter.
///
/// A Matter parent resolves immediately. A Folder parent is fetched and its
/// own parent inspected, up to [`MAX_FOLDER_DEPTH`] times. A missing parent,
/// any other parent type, or running out of depth yields `None`. A failed
/// folder fetch is an error.
pub async fn resolve_matter_id(
    api: &dyn ClioApi,
    token: &str,
    parent: Option<&ParentRef>,
) -> ClioResult<MatterResolution> {
    let mut folders_visited = 0;
    let mut current = parent.cloned();

    while let Some(node) = current {
        if node.is_matter() {
            return Ok(MatterResolution {
                matter_id: Some(node.id),
                folders_visited,
            });
        }
        if !node.is_folder() {
            tracing::debug!(parent_type = %node.kind, "Parent is neither Matter nor Folder");
            break;
        }
        if folders_visited >= MAX_FOLDER_DEPTH {
            tracing::info!(
                folder_id = node.id,
                depth = folders_visited,
                "Folder depth limit reached without finding a Matter"
            );
            break;
        }

        let folder = api.fetch_folder(token, node.id).await?;
        folders_visited += 1;
        current = folder.parent;
    }

    Ok(MatterResolution {
        matter_id: None,
        folders_visited,
    })
}

/// Everything needed to create a quote from a custom-action launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSubject {
    pub subject_id: i64,
    pub subject_type: ClioSubjectType,
    pub matter_id: Option<i64>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub description: Option<String>,
}

/// Resolve a custom-action launch into quote fields.
///
/// The nonce is validated first; a rejected nonce stops everything. Any later
/// fetch failure is returned as-is so no partial quote is created.
pub async fn resolve_custom_action(
    api: &dyn ClioApi,
    token: &str,
    subject_url: &str,
    nonce: &str,
) -> ClioResult<ResolvedSubject> {
    let kind = ClioSubjectType::from_subject_url(subject_url)
        .ok_or_else(|| ClioError::InvalidSubjectUrl(subject_url.to_string()))?;

    api.validate_nonce(token, subject_url, nonce).await?;
    let subject = api.fetch_subject(token, subject_url, kind).await?;

    let (matter_id, matter) = match kind {
        ClioSubjectType::Matter => (Some(subject.id), Some(subject.clone())),
        ClioSubjectType::Document | ClioSubjectType::Folder => {
            let resolution = resolve_matter_id(api, token, subject.parent.as_ref()).await?;
            let matter = match resolution.matter_id {
                Some(id) => Some(api.fetch_matter(token, id).await?),
                None => None,
            };
            (resolution.matter_id, matter)
        }
    };

    let client = matter.and_then(|m: ClioSubject| m.client).unwrap_or_default();

    tracing::info!(
        subject_id = subject.id,
        subject_type = %kind,
        matter_id = ?matter_id,
        "Resolved Clio custom action"
    );

    Ok(ResolvedSubject {
        subject_id: subject.id,
        subject_type: kind,
        matter_id,
        client_name: client.name,
        client_email: client.primary_email_address,
        description: subject.label(),
    })
}
