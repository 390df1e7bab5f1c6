//! Error types for Clio calls.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClioError {
    #[error("Clio request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Clio API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Clio rejected the custom action nonce")]
    InvalidNonce,

    #[error("Invalid Clio subject URL: {0}")]
    InvalidSubjectUrl(String),

    #[error("Unexpected Clio response: {0}")]
    UnexpectedResponse(String),
}

impl ClioError {
    /// HTTP status reported by Clio, if the error came from an API response.
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            ClioError::Api { status, .. } => Some(*status),
            ClioError::InvalidNonce => Some(403),
            _ => None,
        }
    }
}

pub type ClioResult<T> = Result<T, ClioError>;
