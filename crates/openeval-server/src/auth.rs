//! Authentication: Supabase session tokens and back-office roles.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use openeval_core::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Audience Supabase puts on signed-in user tokens.
const SUPABASE_AUDIENCE: &str = "authenticated";

/// Supabase access token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Supabase auth user id.
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub aud: Option<String>,
    /// Expiration time (unix timestamp).
    pub exp: usize,
}

/// Authenticated user extracted from a Supabase JWT.
///
/// The role comes from the `profiles` table, not from the token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Check if user is admin.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Check if user is the given user_id or is admin.
    pub fn is_self_or_admin(&self, user_id: Uuid) -> bool {
        self.user_id == user_id || self.is_admin()
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
    }

    /// Allow the record's owner or an admin.
    pub fn require_self_or_admin(&self, owner: Option<Uuid>) -> Result<(), ApiError> {
        match owner {
            Some(owner) if self.is_self_or_admin(owner) => Ok(()),
            None if self.is_admin() => Ok(()),
            _ => Err(ApiError::Forbidden(
                "You do not have access to this resource".to_string(),
            )),
        }
    }
}

/// Validate a Supabase JWT and return its claims.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[SUPABASE_AUDIENCE]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized(format!("Invalid token: {}", e))
    })?;

    Ok(token_data.claims)
}

/// Pull the bearer token out of the `Authorization` header.
pub fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Authorization header must be Bearer <token>".to_string())
        })
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = validate_token(token, &state.config().supabase_jwt_secret)?;
        let role = state.store().get_role(claims.sub).await?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            email: claims.email,
            role,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{EncodingKey, Header, encode};

    pub(crate) fn create_token(user_id: Uuid, secret: &str, expires_in_secs: i64) -> String {
        let exp = (chrono::Utc::now().timestamp() + expires_in_secs) as usize;
        let claims = Claims {
            sub: user_id,
            email: Some("ana@example.com".to_string()),
            aud: Some(SUPABASE_AUDIENCE.to_string()),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: None,
            role,
        }
    }

    #[test]
    fn test_validate_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, "secret", 3600);
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_validate_token_wrong_secret() {
        let token = create_token(Uuid::new_v4(), "secret1", 3600);
        assert!(matches!(
            validate_token(&token, "secret2"),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_validate_token_expired() {
        let token = create_token(Uuid::new_v4(), "secret", -7200);
        assert!(validate_token(&token, "secret").is_err());
    }

    #[test]
    fn test_validate_token_wrong_audience() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: None,
            aud: Some("service_role".to_string()),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(validate_token(&token, "secret").is_err());
    }

    #[test]
    fn test_bearer_token() {
        let (parts, _) = Request::builder()
            .header("Authorization", "Bearer abc.def")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def");

        let (parts, _) = Request::builder()
            .header("Authorization", "Basic xyz")
            .body(())
            .unwrap()
            .into_parts();
        assert!(bearer_token(&parts).is_err());

        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn test_admin_checks() {
        let admin = user(Role::Admin);
        let plain = user(Role::User);

        assert!(admin.require_admin().is_ok());
        assert!(plain.require_admin().is_err());

        assert!(plain.require_self_or_admin(Some(plain.user_id)).is_ok());
        assert!(plain.require_self_or_admin(Some(Uuid::new_v4())).is_err());
        assert!(plain.require_self_or_admin(None).is_err());
        assert!(admin.require_self_or_admin(Some(Uuid::new_v4())).is_ok());
        assert!(admin.require_self_or_admin(None).is_ok());
    }
}
