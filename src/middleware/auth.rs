// ABOUTME: Authentication middleware resolving the caller from a JWT
// ABOUTME: Accepts the auth_token cookie or an Authorization Bearer header
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::auth::{AuthManager, AuthResult};
use crate::constants::auth::AUTH_COOKIE_NAME;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;
use std::sync::Arc;
use tracing::{debug, field, instrument, Span};

/// Resolves request headers into an authenticated caller
#[derive(Clone)]
pub struct AuthMiddleware {
    auth_manager: Arc<AuthManager>,
    database: Database,
}

impl AuthMiddleware {
    /// Create new auth middleware
    #[must_use]
    pub const fn new(auth_manager: Arc<AuthManager>, database: Database) -> Self {
        Self {
            auth_manager,
            database,
        }
    }

    /// Authenticate a request from its headers
    ///
    /// The cookie is tried first, then the `Authorization` header. The user
    /// must still exist and be active.
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when no token is present, the token error when
    /// validation fails, and `AuthInvalid` for deleted or deactivated users
    #[instrument(skip(self, headers), fields(auth_method = field::Empty, user_id = field::Empty))]
    pub async fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthResult> {
        let (method, token) = if let Some(token) = cookie_value(headers, AUTH_COOKIE_NAME) {
            ("cookie", token)
        } else if let Some(token) = bearer_token(headers) {
            ("bearer", token)
        } else {
            debug!("No authentication token in request");
            return Err(AppError::auth_required());
        };
        Span::current().record("auth_method", method);

        let auth = self.auth_manager.authenticate(&token)?;
        Span::current().record("user_id", auth.user_id.to_string());

        match self.database.get_user(auth.user_id).await? {
            Some(user) if user.is_active => Ok(AuthResult {
                user_id: user.id,
                email: user.email,
                role: user.role,
            }),
            Some(_) => {
                AppLogger::log_auth_event(
                    &auth.user_id.to_string(),
                    "token_rejected",
                    false,
                    Some("account deactivated"),
                );
                Err(AppError::auth_invalid("Account is deactivated"))
            }
            None => {
                AppLogger::log_security_event(
                    "token_for_deleted_user",
                    "medium",
                    "Valid token presented for a user that no longer exists",
                    Some(&auth.user_id.to_string()),
                );
                Err(AppError::auth_invalid("User no longer exists"))
            }
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_owned())
}

/// Read a cookie value by name
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_cookie_value_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; auth_token=tok123; lang=en"),
        );
        assert_eq!(cookie_value(&headers, "auth_token").as_deref(), Some("tok123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
