// ABOUTME: Account registration, login and profile management
// ABOUTME: Validates credentials, hashes passwords and issues session tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::auth::{hash_password, verify_password, AuthManager};
use crate::constants::limits::MIN_PASSWORD_LENGTH;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::{User, UserPreferences, UserProfile, UserRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Registration body
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Email address, stored lower-cased
    pub email: String,
    /// Plain password, at least eight characters
    pub password: String,
    /// Optional display name
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Login body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Plain password
    pub password: String,
}

/// Issued session
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    /// Bearer token
    pub token: String,
    /// Token expiry
    pub expires_at: DateTime<Utc>,
    /// The signed-in user
    pub user: UserProfile,
}

/// Account operations
#[derive(Clone)]
pub struct AccountService {
    database: Database,
    auth_manager: Arc<AuthManager>,
}

impl AccountService {
    /// Create the service
    #[must_use]
    pub const fn new(database: Database, auth_manager: Arc<AuthManager>) -> Self {
        Self {
            database,
            auth_manager,
        }
    }

    /// Register a new user and sign them in
    ///
    /// # Errors
    ///
    /// Returns 400 for a malformed email or short password and 409 when the
    /// email is taken
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let email = validate_email(&request.email)?;
        validate_password(&request.password)?;

        if self.database.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::already_exists(format!(
                "Email {email} is already registered"
            )));
        }

        let password_hash = hash_password(&request.password).await?;
        let display_name = request
            .display_name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());
        let user = User::new(&email, password_hash, display_name);
        self.database.create_user(&user).await?;

        AppLogger::log_auth_event(&user.id.to_string(), "register", true, None);
        self.issue(user).await
    }

    /// Sign in with email and password
    ///
    /// # Errors
    ///
    /// Returns 401 for unknown emails or wrong passwords and 403 for
    /// deactivated accounts
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let invalid = || AppError::auth_invalid("Invalid email or password");

        let Some(user) = self.database.get_user_by_email(&request.email).await? else {
            AppLogger::log_auth_event("unknown", "login", false, Some("unknown email"));
            return Err(invalid());
        };
        if !verify_password(&request.password, &user.password_hash).await? {
            AppLogger::log_auth_event(&user.id.to_string(), "login", false, Some("bad password"));
            return Err(invalid());
        }
        if !user.is_active {
            AppLogger::log_auth_event(&user.id.to_string(), "login", false, Some("deactivated"));
            return Err(AppError::permission_denied("Account is deactivated"));
        }

        self.database.update_last_login(user.id).await?;
        AppLogger::log_auth_event(&user.id.to_string(), "login", true, None);
        self.issue(user).await
    }

    /// Profile with saved and authored recipe ids
    ///
    /// # Errors
    ///
    /// Returns 404 when the user does not exist
    pub async fn profile(&self, user_id: Uuid) -> AppResult<UserProfile> {
        let user = self.find(user_id).await?;
        self.to_profile(user).await
    }

    /// Current preferences
    ///
    /// # Errors
    ///
    /// Returns 404 when the user does not exist
    pub async fn preferences(&self, user_id: Uuid) -> AppResult<UserPreferences> {
        Ok(self.find(user_id).await?.preferences)
    }

    /// Replace preferences
    ///
    /// # Errors
    ///
    /// Returns 400 for zero default servings and 404 when the user does not exist
    pub async fn update_preferences(
        &self,
        user_id: Uuid,
        preferences: UserPreferences,
    ) -> AppResult<UserPreferences> {
        if preferences.default_servings == 0 {
            return Err(AppError::invalid_input("Default servings must be at least 1"));
        }
        let preferences = UserPreferences {
            dietary_restrictions: clean_list(preferences.dietary_restrictions),
            allergies: clean_list(preferences.allergies),
            favorite_cuisines: clean_list(preferences.favorite_cuisines),
            default_servings: preferences.default_servings,
        };
        self.database
            .update_user_preferences(user_id, &preferences)
            .await?;
        Ok(preferences)
    }

    /// Create the admin account or promote an existing user
    ///
    /// An existing account keeps its password unless `reset_password` is set.
    ///
    /// # Errors
    ///
    /// Returns 400 for invalid credentials or a database error
    pub async fn ensure_admin(
        &self,
        email: &str,
        password: &str,
        reset_password: bool,
    ) -> AppResult<User> {
        let email = validate_email(email)?;
        validate_password(password)?;

        if let Some(mut user) = self.database.get_user_by_email(&email).await? {
            self.database.update_user_role(user.id, UserRole::Admin).await?;
            self.database.set_user_active(user.id, true).await?;
            if reset_password {
                let hash = hash_password(password).await?;
                self.database.update_user_password(user.id, &hash).await?;
            }
            user.role = UserRole::Admin;
            user.is_active = true;
            AppLogger::log_admin_action("setup", "promote_admin", &user.id.to_string());
            return Ok(user);
        }

        let mut user = User::new(&email, hash_password(password).await?, Some("Admin".to_owned()));
        user.role = UserRole::Admin;
        self.database.create_user(&user).await?;
        AppLogger::log_admin_action("setup", "create_admin", &user.id.to_string());
        Ok(user)
    }

    async fn issue(&self, user: User) -> AppResult<AuthResponse> {
        let issued = self.auth_manager.generate_token(&user)?;
        Ok(AuthResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user: self.to_profile(user).await?,
        })
    }

    async fn to_profile(&self, user: User) -> AppResult<UserProfile> {
        let saved = self.database.saved_recipe_ids(user.id).await?;
        let created = self.database.authored_recipe_ids(user.id).await?;
        Ok(UserProfile::from_user(user, saved, created))
    }

    async fn find(&self, user_id: Uuid) -> AppResult<User> {
        self.database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }
}

/// Lower-cased email if it has a plausible `local@domain.tld` shape
///
/// # Errors
///
/// Returns 400 otherwise
pub fn validate_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .split_once('.')
                .is_some_and(|(name, tld)| !name.is_empty() && !tld.is_empty())
            && !domain.ends_with('.')
    }) && !email.chars().any(char::is_whitespace);

    if valid {
        Ok(email)
    } else {
        Err(AppError::invalid_format("Email address is not valid"))
    }
}

/// Minimum length check
///
/// # Errors
///
/// Returns 400 for passwords shorter than the minimum
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = values
        .into_iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect();
    cleaned.dedup();
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert_eq!(validate_email(" Cook@Example.com ").unwrap(), "cook@example.com");
        for bad in ["cook", "@example.com", "cook@", "cook@example", "co ok@example.com", "a@b@c.io", "a@b."] {
            assert!(validate_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }
}
