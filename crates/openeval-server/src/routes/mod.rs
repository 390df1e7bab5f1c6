//! Route definitions for the HTTP API.

pub mod api_keys;
pub mod clio_oauth;
pub mod clio_quotes;
pub mod custom_action;
pub mod health;
pub mod payments;
pub mod quotes;
pub mod webhooks;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// Build the complete router with all routes.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config().max_upload_bytes;

    Router::new()
        .merge(health::routes())
        .merge(clio_oauth::routes())
        .merge(custom_action::routes())
        .merge(webhooks::routes())
        .merge(clio_quotes::routes())
        .merge(quotes::routes())
        .merge(api_keys::routes())
        .merge(payments::routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// `302 Found` to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_redirect() {
        let response = found("https://openeval.app/clio/quotes/1");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://openeval.app/clio/quotes/1"
        );
    }
}
