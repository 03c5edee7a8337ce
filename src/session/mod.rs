//! Session token codec.
//!
//! Sessions are stateless: a signed, time-boxed JWT carried in an HTTP-only
//! cookie is the whole session. The server keeps no session table, so the
//! only ways a session ends are cookie deletion (logout) or expiry.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{User, UserResponse};

/// Session cookie name
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session token expired")]
    Expired,
    #[error("invalid session token")]
    Invalid,
    #[error("failed to sign session token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Claims embedded in the session token. They are a snapshot of the user at
/// login time and are not re-read from the store on later requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl From<Claims> for UserResponse {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// Sign a session token for a user with the given lifetime.
pub fn sign(user: &User, secret: &str, ttl_secs: i64) -> Result<String, SessionError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        iat: now,
        exp: now + ttl_secs,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(SessionError::Signing)
}

/// Verify a session token's signature and expiry, returning its claims.
pub fn verify(token: &str, secret: &str) -> Result<Claims, SessionError> {
    let mut validation = Validation::default();
    // No clock leeway: an elapsed expiry is rejected immediately.
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => SessionError::Expired,
        _ => SessionError::Invalid,
    })
}

/// Build the session cookie set at login: HTTP-only, path-scoped to the whole
/// site, with the session lifetime as Max-Age.
pub fn session_cookie(token: String, ttl_secs: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl_secs))
        .build()
}

/// Build the clearing cookie set at logout: empty value, immediate expiry.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: "u-1".to_string(),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            password_hash: String::new(),
            created_at: String::new(),
        }
    }

    #[test]
    fn sign_then_verify_round_trips_claims() {
        let token = sign(&test_user(), "secret", 3600).unwrap();
        let claims = verify(&token, "secret").unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.name, "Ada");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign(&test_user(), "secret", 3600).unwrap();
        assert!(matches!(
            verify(&token, "other-secret"),
            Err(SessionError::Invalid)
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = sign(&test_user(), "secret", 3600).unwrap();
        let tampered = format!("{}x", token);
        assert!(verify(&tampered, "secret").is_err());
    }

    #[test]
    fn elapsed_expiry_is_rejected_despite_valid_signature() {
        let token = sign(&test_user(), "secret", -120).unwrap();
        assert!(matches!(
            verify(&token, "secret"),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("tok".to_string(), 3600);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let cookie = removal_cookie();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
