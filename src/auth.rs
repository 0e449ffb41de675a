// ABOUTME: JWT-based user authentication and authorization
// ABOUTME: Issues and validates HS256 tokens, hashes passwords, and enforces admin access
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Authentication
//!
//! Tokens are HS256 JWTs with `sub` (user id), `email`, `role`, `iat`, `exp`
//! and `aud = "smartplates"`. Expired, malformed and badly signed tokens are
//! reported as distinct errors so clients can tell "log in again" apart from
//! "this token was never valid".

use crate::constants::auth::{BCRYPT_COST, JWT_AUDIENCE};
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserRole};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::task;
use tracing::{debug, warn};
use uuid::Uuid;

/// `JWT` claims for user authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID`
    pub sub: String,
    /// User email
    pub email: String,
    /// Role at issue time
    pub role: UserRole,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Audience (who the token is intended for)
    pub aud: String,
}

/// Authenticated caller extracted from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    /// Authenticated user `ID`
    pub user_id: Uuid,
    /// Email from the token
    pub email: String,
    /// Role from the token
    pub role: UserRole,
}

impl AuthResult {
    /// Whether the caller is an admin
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Reject non-admin callers with 403
///
/// # Errors
///
/// Returns `PermissionDenied` unless the caller is an admin
pub fn require_admin(auth: &AuthResult) -> AppResult<()> {
    if auth.is_admin() {
        Ok(())
    } else {
        warn!(user_id = %auth.user_id, "Non-admin attempted an admin operation");
        Err(AppError::permission_denied("Admin privileges required"))
    }
}

/// Signed token plus its expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Encoded `JWT`
    pub token: String,
    /// Expiration time
    pub expires_at: DateTime<Utc>,
}

/// Authentication manager for `JWT` tokens
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
}

impl AuthManager {
    /// Create a manager signing with `secret`
    #[must_use]
    pub fn new(secret: &[u8], token_expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_expiry_hours,
        }
    }

    /// Token lifetime in hours
    #[must_use]
    pub const fn token_expiry_hours(&self) -> i64 {
        self.token_expiry_hours
    }

    /// Generate a `JWT` token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails
    pub fn generate_token(&self, user: &User) -> AppResult<IssuedToken> {
        self.generate_token_at(user, Utc::now())
    }

    /// Generate a token as if issued at `now`
    ///
    /// # Errors
    ///
    /// Returns an error if the expiry is not representable or encoding fails
    pub fn generate_token_at(&self, user: &User, now: DateTime<Utc>) -> AppResult<IssuedToken> {
        let expires_at = Duration::try_hours(self.token_expiry_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AppError::config(format!(
                    "Token lifetime of {} hours is out of range",
                    self.token_expiry_hours
                ))
            })?;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            aud: JWT_AUDIENCE.to_owned(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a token and return its claims
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired`, `AuthMalformed` or `AuthInvalid` depending on
    /// why the token was rejected
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[JWT_AUDIENCE]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))
    }

    /// Validate a token and build the caller context
    ///
    /// # Errors
    ///
    /// Returns an auth error when the token is rejected or `sub` is not a UUID
    pub fn authenticate(&self, token: &str) -> AppResult<AuthResult> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::auth_malformed("Token subject is not a user id"))?;
        Ok(AuthResult {
            user_id,
            email: claims.email,
            role: claims.role,
        })
    }

    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> AppError {
        debug!("JWT validation failed: {e:?}");
        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::auth_expired(),
            ErrorKind::InvalidSignature => {
                AppError::auth_invalid("Token signature verification failed")
            }
            ErrorKind::InvalidAudience => AppError::auth_invalid("Token audience is invalid"),
            ErrorKind::InvalidToken => AppError::auth_malformed("Token format is invalid"),
            ErrorKind::Base64(err) => {
                AppError::auth_malformed(format!("Token contains invalid base64: {err}"))
            }
            ErrorKind::Json(err) => {
                AppError::auth_malformed(format!("Token contains invalid JSON: {err}"))
            }
            ErrorKind::Utf8(err) => {
                AppError::auth_malformed(format!("Token contains invalid UTF-8: {err}"))
            }
            _ => AppError::auth_invalid(format!("Token validation failed: {e}")),
        }
    }
}

/// Generate a random 64 byte `JWT` secret
#[must_use]
pub fn generate_jwt_secret() -> [u8; 64] {
    let mut secret = [0u8; 64];
    OsRng.fill_bytes(&mut secret);
    secret
}

/// Hash a password with bcrypt off the async runtime
///
/// # Errors
///
/// Returns an error if hashing fails or the blocking task panics
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_owned();
    task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
}

/// Check a password against a bcrypt hash; malformed hashes never match
///
/// # Errors
///
/// Returns an error if the blocking task panics
pub async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let verified = task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?;
    Ok(verified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    fn user(role: UserRole) -> User {
        let mut user = User::new("cook@example.com", String::new(), None);
        user.role = role;
        user
    }

    #[test]
    fn test_token_round_trip_carries_role() {
        let manager = AuthManager::new(b"test-secret", 24);
        let admin = user(UserRole::Admin);
        let issued = manager.generate_token(&admin).unwrap();

        let auth = manager.authenticate(&issued.token).unwrap();
        assert_eq!(auth.user_id, admin.id);
        assert_eq!(auth.role, UserRole::Admin);
        assert!(require_admin(&auth).is_ok());
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let manager = AuthManager::new(b"test-secret", 1);
        let issued = manager
            .generate_token_at(&user(UserRole::User), Utc::now() - Duration::hours(3))
            .unwrap();
        let err = manager.validate_token(&issued.token).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthExpired);
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let manager = AuthManager::new(b"test-secret", i64::MAX);
        let err = manager.generate_token(&user(UserRole::User)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }

    #[test]
    fn test_wrong_secret_is_invalid_and_garbage_is_malformed() {
        let issuer = AuthManager::new(b"secret-a", 24);
        let verifier = AuthManager::new(b"secret-b", 24);
        let issued = issuer.generate_token(&user(UserRole::User)).unwrap();

        assert_eq!(
            verifier.validate_token(&issued.token).unwrap_err().code,
            ErrorCode::AuthInvalid
        );
        assert_eq!(
            verifier.validate_token("not-a-jwt").unwrap_err().code,
            ErrorCode::AuthMalformed
        );
    }

    #[test]
    fn test_require_admin_rejects_regular_user() {
        let auth = AuthResult {
            user_id: Uuid::new_v4(),
            email: "cook@example.com".into(),
            role: UserRole::User,
        };
        assert_eq!(
            require_admin(&auth).unwrap_err().code,
            ErrorCode::PermissionDenied
        );
    }

    #[tokio::test]
    async fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse").await.unwrap();
        assert!(verify_password("correct horse", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
        assert!(!verify_password("x", "not-a-bcrypt-hash").await.unwrap());
    }
}
