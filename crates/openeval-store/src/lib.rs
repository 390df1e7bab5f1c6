//! openeval-store: Storage layer for the OpenEval backend
//!
//! This crate provides:
//! - PostgreSQL storage for OAuth states, provider integrations, Clio quotes,
//!   API keys, web/API quotes and profiles
//! - Embedded, idempotent migrations
//! - Type-safe database operations via sqlx
//!
//! # Usage
//!
//! ```rust,ignore
//! use openeval_store::{Store, StoreConfig};
//!
//! let config = StoreConfig::from_env()?;
//! let store = Store::connect(config).await?;
//!
//! store.insert_oauth_state("abc", user_id, "clio").await?;
//! let consumed = store.consume_oauth_state("abc", "clio").await?;
//! ```

pub mod error;
pub mod models;
pub mod schema;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use models::*;
pub use store::{Store, StoreConfig};

// Re-export openeval-core for downstream crates
pub use openeval_core;
