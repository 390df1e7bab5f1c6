//! Stripe payment and card-setup intents for quotes.

use axum::{Json, Router, extract::State, routing::post};
use openeval_store::StoreError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_CURRENCY: &str = "usd";

#[derive(Debug, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub quote_id: Uuid,
    pub amount_cents: i64,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CreatePaymentIntentRequest {
    /// Lowercase ISO currency code, `usd` when omitted.
    pub fn currency(&self) -> ApiResult<String> {
        let currency = self
            .currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_ascii_lowercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ApiError::BadRequest(format!(
                "Invalid currency '{}'",
                currency
            )));
        }
        Ok(currency)
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSetupIntentRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetupIntentResponse {
    pub id: String,
    pub client_secret: String,
    pub customer_id: String,
}

/// The intent already exists at Stripe when the amount write fails, so log
/// its id for manual follow-up before surfacing the store error.
fn unrecorded_amount(quote_id: Uuid, intent_id: &str, amount_cents: i64, error: StoreError) -> ApiError {
    tracing::error!(
        quote_id = %quote_id,
        intent_id = %intent_id,
        amount_cents,
        error = %error,
        "PaymentIntent created but quote amount not recorded; needs manual follow-up"
    );
    error.into()
}

/// POST /api/payments/intents - Create a PaymentIntent for a quote (owner or
/// admin) and record the amount on the quote.
///
/// # Response
///
/// - 200 OK: `{id, client_secret}`
/// - 400 Bad Request: Non-positive amount or bad currency
/// - 404 Not Found: Quote doesn't exist
/// - 500 Internal Server Error: Stripe not configured, or Stripe refused
async fn create_payment_intent(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreatePaymentIntentRequest>,
) -> ApiResult<Json<PaymentIntentResponse>> {
    if req.amount_cents <= 0 {
        return Err(ApiError::BadRequest(
            "amount_cents must be positive".to_string(),
        ));
    }
    let currency = req.currency()?;

    let quote = state.store().get_quote(req.quote_id).await?;
    user.require_self_or_admin(quote.user_id)?;

    let stripe = state.stripe().ok_or(ApiError::NotConfigured("Stripe"))?;
    let intent = stripe
        .create_payment_intent(req.amount_cents, &currency, &quote.id.to_string())
        .await?;

    if let Err(e) = state
        .store()
        .set_quote_amount(quote.id, req.amount_cents)
        .await
    {
        return Err(unrecorded_amount(quote.id, &intent.id, req.amount_cents, e));
    }

    Ok(Json(PaymentIntentResponse {
        id: intent.id,
        client_secret: intent.client_secret,
    }))
}

/// POST /api/payments/setup-intents - Save a card for later charges.
///
/// Creates a Stripe customer for `email` (the caller's own address when
/// omitted), then an off-session SetupIntent for it.
async fn create_setup_intent(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateSetupIntentRequest>,
) -> ApiResult<Json<SetupIntentResponse>> {
    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .or(user.email.as_deref())
        .ok_or_else(|| ApiError::BadRequest("email is required".to_string()))?
        .to_string();

    let stripe = state.stripe().ok_or(ApiError::NotConfigured("Stripe"))?;
    let customer = stripe.create_customer(&email).await?;
    let intent = stripe.create_setup_intent(&customer.id).await?;

    tracing::info!(
        user_id = %user.user_id,
        customer_id = %customer.id,
        intent_id = %intent.id,
        "Created Stripe SetupIntent"
    );

    Ok(Json(SetupIntentResponse {
        id: intent.id,
        client_secret: intent.client_secret,
        customer_id: customer.id,
    }))
}

/// Build payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments/intents", post(create_payment_intent))
        .route("/api/payments/setup-intents", post(create_setup_intent))
}
