//! openeval-core: Core types and primitives for the OpenEval backend
//!
//! This crate provides:
//! - Domain enums shared by the store, the integrations and the server
//!   (quote status, Clio subject kinds, parent references)
//! - The token vault used to keep provider OAuth tokens encrypted at rest
//! - API key generation, hashing and prefix handling
//! - HMAC-SHA256 signing helpers for cookies and webhooks

pub mod types;

pub use types::{
    ClioQuoteStatus, ClioSubjectType, ParentRef, ParseEnumError, QuoteSource, QuoteStatus, Role,
    ServiceType,
};

pub mod api_key;
pub mod signing;
pub mod vault;

pub use api_key::{ApiKeyError, GeneratedApiKey};
pub use vault::{TokenVault, VaultError};
