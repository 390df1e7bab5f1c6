//! openeval-integrations: outbound provider clients for the OpenEval backend
//!
//! This crate provides:
//! - A Clio client (OAuth token exchange and refresh, custom actions,
//!   subjects, folders, documents) behind the [`clio::ClioApi`] trait
//! - The custom-action resolver, including the bounded Folder→Matter walk
//! - The three-step Clio document upload pipeline
//! - Minimal Stripe (PaymentIntent, SetupIntent) and Resend (email) clients
//!
//! Every client is constructed explicitly and handed to its callers; there
//! are no process-wide instances.

pub mod clio;
pub mod http;
pub mod resend;
pub mod stripe;

pub use clio::{ClioApi, ClioClient, ClioConfig, ClioError, ClioResult};
pub use resend::{EmailMessage, ResendClient, ResendError};
pub use stripe::{StripeClient, StripeError};
