//! Admin token issuing and verification (HS512 JWTs).

use axum::http::{header, HeaderMap};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

const TOKEN_LIFETIME_SECS: i64 = 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: i64,
}

/// Issue a fresh admin token, valid for one hour.
pub fn issue_token(secret: &str) -> Result<String, AppError> {
    let claims = Claims {
        exp: Utc::now().timestamp() + TOKEN_LIFETIME_SECS,
    };
    encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("unable to generate token: {e}")))
}

fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS512),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::AuthError(e.to_string()))
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::AuthError("please provide an authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::AuthError("authorization header invalid".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::AuthError("authorization header invalid".to_string()))
}

/// Guard for admin-only handlers.
pub fn require_auth(headers: &HeaderMap, secret: &str) -> Result<(), AppError> {
    let token = bearer_token(headers)?;
    verify_token(token, secret)?;
    Ok(())
}

/// Non-failing variant, used where authentication upgrades a response rather
/// than gating it (shop-open bypass, payment detail visibility).
pub fn is_authenticated(headers: &HeaderMap, secret: &str) -> bool {
    require_auth(headers, secret).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_issued_token_verifies() {
        let token = issue_token(SECRET).unwrap();
        assert!(verify_token(&token, SECRET).is_ok());
    }

    #[test]
    fn test_wrong_secret_fails() {
        let token = issue_token(SECRET).unwrap();
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn test_garbage_token_fails() {
        assert!(verify_token("not.a.jwt", SECRET).is_err());
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(matches!(
            require_auth(&headers, SECRET),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn test_non_bearer_header_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(require_auth(&headers, SECRET).is_err());
    }

    #[test]
    fn test_valid_bearer_header_passes() {
        let token = issue_token(SECRET).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert!(require_auth(&headers, SECRET).is_ok());
        assert!(is_authenticated(&headers, SECRET));
    }
}
