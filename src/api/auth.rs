//! Auth handlers: register, login, logout, session check.
//!
//! All four are stateless request/response functions. Login issues the signed
//! session cookie; session-check verifies it and echoes the claims snapshot
//! without touching the store.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::db::{
    AuthResponse, LoginRequest, MessageResponse, RegisterRequest, SessionResponse, User,
    UserResponse,
};
use crate::session::{self, Claims, SESSION_COOKIE};
use crate::AppState;

use super::error::{is_unique_violation, ApiError};
use super::validation::{validate_email, validate_name, validate_password};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Register endpoint
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    validate_email(&request.email).map_err(ApiError::bad_request)?;
    validate_password(&request.password).map_err(ApiError::bad_request)?;
    validate_name(&request.name).map_err(ApiError::bad_request)?;

    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;

    if existing.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let password_hash = hash_password(&request.password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::internal("Internal server error")
    })?;

    sqlx::query("INSERT INTO users (id, email, name, password_hash) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(&request.email)
        .bind(&request.name)
        .bind(&password_hash)
        .execute(&state.db)
        .await
        .map_err(|e| {
            // A concurrent registration may win the race to the uniqueness
            // constraint; report it the same as the pre-insert check.
            if is_unique_violation(&e) {
                ApiError::bad_request("User already exists")
            } else {
                ApiError::from(e)
            }
        })?;

    tracing::info!(email = %request.email, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse {
                id,
                email: request.email,
                name: request.name,
            },
        }),
    ))
}

/// Login endpoint
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;

    // Unknown email and wrong password must be indistinguishable to the
    // caller, so both paths produce the identical error.
    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = session::sign(
        &user,
        &state.config.auth.jwt_secret,
        state.config.auth.session_ttl_secs,
    )
    .map_err(|e| {
        tracing::error!("Failed to sign session token: {}", e);
        ApiError::internal("Internal server error")
    })?;

    let jar = jar.add(session::session_cookie(
        token,
        state.config.auth.session_ttl_secs,
    ));

    tracing::debug!(email = %user.email, "Login successful");

    Ok((
        jar,
        Json(AuthResponse {
            user: UserResponse::from(user),
        }),
    ))
}

/// Logout endpoint. Clears the session cookie; idempotent.
///
/// POST /api/auth/logout
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.add(session::removal_cookie());
    (
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// Session-check endpoint. Verifies the cookie and returns the claims
/// snapshot from login time; 401 `{user: null}` when absent or invalid.
///
/// GET /api/auth/session
pub async fn session_check(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let claims = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| session::verify(cookie.value(), &state.config.auth.jwt_secret).ok());

    match claims {
        Some(claims) => (
            StatusCode::OK,
            Json(SessionResponse {
                user: Some(UserResponse::from(claims)),
            }),
        ),
        None => (StatusCode::UNAUTHORIZED, Json(SessionResponse { user: None })),
    }
}

/// Extractor for the current session's claims. Handlers that take `Claims`
/// reject unauthenticated requests with a 401.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Claims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar
            .get(SESSION_COOKIE)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        session::verify(cookie.value(), &state.config.auth.jwt_secret)
            .map_err(|_| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted_but_both_verify() {
        let first = hash_password("correct horse battery").unwrap();
        let second = hash_password("correct horse battery").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("correct horse battery", &first));
        assert!(verify_password("correct horse battery", &second));
    }

    #[test]
    fn wrong_password_fails_verification() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn garbage_hash_fails_closed() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
