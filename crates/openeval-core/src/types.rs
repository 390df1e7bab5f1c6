//! Core data types for the OpenEval backend.
//!
//! The enums here are stored as text columns and travel over the wire as
//! strings. Each one implements `Display`/`FromStr` with the exact spelling
//! used in the database so the store can map rows without a lookup table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a stored string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// Clio
// ============================================================================

/// The kind of Clio record a custom action was launched from.
///
/// Clio capitalises these in `parent.type` fields, and we store them the same
/// way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClioSubjectType {
    Matter,
    Document,
    Folder,
}

impl ClioSubjectType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Matter => "Matter",
            Self::Document => "Document",
            Self::Folder => "Folder",
        }
    }

    /// Infer the subject type from the shape of a Clio API URL.
    ///
    /// Clio subject URLs look like `/api/v4/matters/123` or
    /// `https://app.clio.com/api/v4/documents/456.json`.
    pub fn from_subject_url(url: &str) -> Option<Self> {
        if url.contains("/matters/") {
            Some(Self::Matter)
        } else if url.contains("/documents/") {
            Some(Self::Document)
        } else if url.contains("/folders/") {
            Some(Self::Folder)
        } else {
            None
        }
    }
}

impl fmt::Display for ClioSubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClioSubjectType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Matter" => Ok(Self::Matter),
            "Document" => Ok(Self::Document),
            "Folder" => Ok(Self::Folder),
            other => Err(ParseEnumError::new("Clio subject type", other)),
        }
    }
}

/// A `parent` reference as returned by Clio for documents and folders.
///
/// The type is kept as a raw string: Clio may return types other than
/// `Matter` and `Folder`, and the resolver must stop on those rather than
/// fail to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ParentRef {
    pub fn new(id: i64, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
        }
    }

    pub fn is_matter(&self) -> bool {
        self.kind == "Matter"
    }

    pub fn is_folder(&self) -> bool {
        self.kind == "Folder"
    }
}

/// Lifecycle of a quote created from a Clio custom action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClioQuoteStatus {
    Pending,
    Completed,
}

impl ClioQuoteStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ClioQuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClioQuoteStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(ParseEnumError::new("Clio quote status", other)),
        }
    }
}

// ============================================================================
// Quotes
// ============================================================================

/// Channel a quote request arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    Web,
    Api,
}

impl QuoteSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteSource {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(Self::Web),
            "api" => Ok(Self::Api),
            other => Err(ParseEnumError::new("quote source", other)),
        }
    }
}

/// What the customer is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Translation,
    Evaluation,
}

impl ServiceType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Translation => "translation",
            Self::Evaluation => "evaluation",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "translation" => Ok(Self::Translation),
            "evaluation" => Ok(Self::Evaluation),
            other => Err(ParseEnumError::new("service type", other)),
        }
    }
}

/// Lifecycle of a web/API quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Pending,
    Quoted,
    Paid,
    Completed,
    Cancelled,
}

impl QuoteStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Quoted => "quoted",
            Self::Paid => "paid",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "quoted" => Ok(Self::Quoted),
            "paid" => Ok(Self::Paid),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseEnumError::new("quote status", other)),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// Back-office role attached to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}
