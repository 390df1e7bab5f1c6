//! openeval-server: HTTP API for the OpenEval Clio integration
//!
//! This crate provides:
//! - Clio OAuth connect/disconnect and the deauthorize webhook
//! - The custom-action endpoint that turns a Clio click into a quote
//! - The document bridge (download from Clio, upload evaluations back)
//! - API keys, quote ingestion, confirmation emails and Stripe intents
//!
//! # Architecture
//!
//! The server is built on Axum with a middleware stack for:
//! - Request tracing and logging
//! - CORS handling
//! - Request ID generation
//! - JSON error responses
//!
//! Provider clients are built once in [`AppState`] and shared by every
//! handler.

pub mod auth;
pub mod clio_session;
pub mod config;
pub mod emails;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ConfigError, LogFormat, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

pub use openeval_core;
pub use openeval_integrations;
pub use openeval_store;
