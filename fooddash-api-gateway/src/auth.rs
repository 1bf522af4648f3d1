//! Bearer token verification.
//!
//! Tokens are issued by the auth service and signed with a shared HS256
//! secret. The gateway only verifies them and turns the claims into a
//! [`Principal`] for the core.

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use fooddash_marketplace_service::{Principal, Role};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::handlers::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub role: Role,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::AuthenticationFailed)?
        .to_str()
        .map_err(|_| ApiError::InvalidToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::InvalidToken)
}

pub fn decode_principal(token: &str, secret: &str) -> Result<Principal, ApiError> {
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        ApiError::InvalidToken
    })?;

    let user_id = token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| ApiError::InvalidToken)?;
    Ok(Principal::new(user_id, token_data.claims.role))
}

/// The verified caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        decode_principal(token, &state.settings.jwt_secret).map(AuthUser)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;

    const SECRET: &str = "test-secret";

    fn token(sub: &str, role: Role, exp_offset: i64, secret: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            role,
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn decodes_user_and_role() {
        let principal = decode_principal(&token("42", Role::Rider, 3600, SECRET), SECRET).unwrap();
        assert_eq!(principal, Principal::new(42, Role::Rider));
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = token("42", Role::Customer, 3600, "other-secret");
        assert!(matches!(
            decode_principal(&token, SECRET),
            Err(ApiError::InvalidToken)
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let token = token("42", Role::Customer, -3600, SECRET);
        assert!(matches!(
            decode_principal(&token, SECRET),
            Err(ApiError::InvalidToken)
        ));
    }

    #[test]
    fn rejects_non_numeric_subject() {
        let token = token("alice", Role::Customer, 3600, SECRET);
        assert!(matches!(
            decode_principal(&token, SECRET),
            Err(ApiError::InvalidToken)
        ));
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(ApiError::AuthenticationFailed)
        ));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(bearer_token(&headers), Err(ApiError::InvalidToken)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc");
    }
}
