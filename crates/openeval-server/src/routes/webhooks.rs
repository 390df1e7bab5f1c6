//! Clio webhooks.
//!
//! Clio calls the deauthorize hook when a user revokes OpenEval from inside
//! Clio. The hook always answers 200 so Clio never retries; anything that
//! goes wrong is logged for manual follow-up.

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::{DefaultBodyLimit, State},
    http::HeaderMap,
    routing::post,
};
use openeval_core::signing::verify_hmac_sha256_hex;
use openeval_store::CLIO_PROVIDER;
use serde::Serialize;
use serde_json::Value;

use crate::state::AppState;

/// Header carrying the hex HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "x-clio-signature";

/// Largest deauthorize payload we read. Bigger bodies are acknowledged and
/// dropped instead of being rejected with 413.
pub const WEBHOOK_MAX_BODY_BYTES: usize = 64 * 1024;

/// Places a Clio user id may appear in a deauthorization payload.
const USER_ID_POINTERS: [&str; 5] = [
    "/data/user/id",
    "/data/user_id",
    "/user/id",
    "/user_id",
    "/data/id",
];

/// Outcome of checking a webhook signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    Valid,
    Invalid,
    /// No secret is configured, so nothing was checked.
    Disabled,
}

pub fn verify_webhook(secret: Option<&str>, signature: Option<&str>, body: &[u8]) -> SignatureCheck {
    let Some(secret) = secret else {
        return SignatureCheck::Disabled;
    };
    match signature {
        Some(sig) if verify_hmac_sha256_hex(secret.as_bytes(), body, sig) => SignatureCheck::Valid,
        _ => SignatureCheck::Invalid,
    }
}

/// Clio user id from a deauthorization payload, as text.
pub fn deauthorized_user_id(payload: &Value) -> Option<String> {
    USER_ID_POINTERS
        .iter()
        .filter_map(|pointer| payload.pointer(pointer))
        .find_map(|value| match value {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /api/clio/webhooks/deauthorize - Drop the integration Clio revoked.
///
/// # Response
///
/// - 200 OK: Always, including bad signatures and internal failures
async fn deauthorize(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Json<WebhookAck> {
    let ack = Json(WebhookAck { received: true });

    let body = match to_bytes(body, WEBHOOK_MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "Could not read Clio deauthorize webhook body");
            return ack;
        }
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    match verify_webhook(state.config().clio_webhook_secret.as_deref(), signature, &body) {
        SignatureCheck::Valid => {}
        SignatureCheck::Disabled => {
            tracing::warn!("CLIO_WEBHOOK_SECRET is not set; webhook signature not verified");
        }
        SignatureCheck::Invalid => {
            tracing::warn!("Ignoring Clio webhook with invalid signature");
            return ack;
        }
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, "Clio deauthorize webhook body is not JSON");
            return ack;
        }
    };
    let Some(clio_user_id) = deauthorized_user_id(&payload) else {
        tracing::error!("Clio deauthorize webhook carries no user id");
        return ack;
    };

    match state
        .store()
        .delete_integrations_by_provider_user(CLIO_PROVIDER, &clio_user_id)
        .await
    {
        Ok(0) => {
            tracing::info!(clio_user_id = %clio_user_id, "No Clio integration to remove");
        }
        Ok(removed) => {
            tracing::info!(clio_user_id = %clio_user_id, removed, "Removed deauthorized Clio integration");
        }
        Err(e) => {
            tracing::error!(
                clio_user_id = %clio_user_id,
                error = %e,
                "Failed to remove deauthorized Clio integration; needs manual cleanup"
            );
        }
    }

    ack
}

/// Build webhook routes.
pub fn routes() -> Router<AppState> {
    // The upload limit is replaced by WEBHOOK_MAX_BODY_BYTES, read in the handler.
    Router::new().route(
        "/api/clio/webhooks/deauthorize",
        post(deauthorize).layer(DefaultBodyLimit::disable()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::routes::build_router;
    use crate::state::tests::test_state_with;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use openeval_core::signing::hmac_sha256_hex;
    use serde_json::json;
    use tower::ServiceExt;

    const BODY: &[u8] = br#"{"data":{"user":{"id":345}}}"#;

    #[test]
    fn test_verify_webhook() {
        let signature = hmac_sha256_hex(b"whsec", BODY);

        assert_eq!(
            verify_webhook(Some("whsec"), Some(&signature), BODY),
            SignatureCheck::Valid
        );
        assert_eq!(
            verify_webhook(Some("whsec"), Some("deadbeef"), BODY),
            SignatureCheck::Invalid
        );
        assert_eq!(verify_webhook(Some("whsec"), None, BODY), SignatureCheck::Invalid);
        assert_eq!(verify_webhook(None, None, BODY), SignatureCheck::Disabled);
    }

    #[test]
    fn test_tampered_body_is_invalid() {
        let signature = hmac_sha256_hex(b"whsec", BODY);
        assert_eq!(
            verify_webhook(Some("whsec"), Some(&signature), br#"{"data":{"user":{"id":1}}}"#),
            SignatureCheck::Invalid
        );
    }

    #[test]
    fn test_deauthorized_user_id() {
        assert_eq!(
            deauthorized_user_id(&json!({"data": {"user": {"id": 345}}})),
            Some("345".to_string())
        );
        assert_eq!(
            deauthorized_user_id(&json!({"user_id": "abc"})),
            Some("abc".to_string())
        );
        assert_eq!(deauthorized_user_id(&json!({"user_id": ""})), None);
        assert_eq!(deauthorized_user_id(&json!({"event": "deauthorize"})), None);
    }

    async fn post_webhook(
        secret: Option<&str>,
        signature: Option<&str>,
        body: impl Into<Body>,
    ) -> StatusCode {
        let mut config = test_config();
        config.clio_webhook_secret = secret.map(str::to_string);
        config.max_upload_bytes = 16;
        let app = build_router(test_state_with(config));

        let mut request = Request::builder()
            .method("POST")
            .uri("/api/clio/webhooks/deauthorize");
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        app.oneshot(request.body(body.into()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_bad_signature_still_acknowledged() {
        assert_eq!(post_webhook(Some("whsec"), Some("00ff"), BODY).await, StatusCode::OK);
        assert_eq!(post_webhook(Some("whsec"), None, BODY).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unusable_payload_still_acknowledged() {
        assert_eq!(post_webhook(None, None, &b"not json"[..]).await, StatusCode::OK);
        assert_eq!(post_webhook(None, None, &br#"{"event":"x"}"#[..]).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_limit_does_not_apply_to_webhook() {
        // The helper caps uploads at 16 bytes.
        let body: &'static [u8] = br#"{"event":"deauthorize","data":{}}"#;
        assert!(body.len() > 16);
        assert_eq!(post_webhook(None, None, body).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_oversized_payload_still_acknowledged() {
        let body = vec![b' '; WEBHOOK_MAX_BODY_BYTES + 1];
        assert_eq!(post_webhook(None, None, body).await, StatusCode::OK);
    }
}
