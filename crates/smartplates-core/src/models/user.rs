// ABOUTME: User account model with role and dietary preferences
// ABOUTME: UserRole, UserPreferences, User and the public UserProfile view
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::AppError;

/// Account role
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular user
    #[default]
    User,
    /// Administrator with moderation rights
    Admin,
}

impl UserRole {
    /// Database / token representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Whether this role has admin privileges
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(AppError::invalid_input(format!("Unknown role: {other}"))),
        }
    }
}

const fn default_servings() -> u32 {
    2
}

/// Dietary preferences used to personalize search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPreferences {
    /// Diets such as "vegetarian" or "gluten free"
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    /// Spoonacular intolerances ("peanut", "dairy", ...)
    #[serde(default)]
    pub allergies: Vec<String>,
    /// Preferred cuisines
    #[serde(default)]
    pub favorite_cuisines: Vec<String>,
    /// Default servings when planning meals
    #[serde(default = "default_servings")]
    pub default_servings: u32,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            dietary_restrictions: Vec::new(),
            allergies: Vec::new(),
            favorite_cuisines: Vec::new(),
            default_servings: default_servings(),
        }
    }
}

/// Stored user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Lower-cased unique email
    pub email: String,
    /// Name shown in the UI
    pub display_name: Option<String>,
    /// bcrypt hash; never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Account role
    pub role: UserRole,
    /// Dietary preferences
    pub preferences: UserPreferences,
    /// Deactivated users cannot log in
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
    /// Last successful login
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new active user with default preferences
    #[must_use]
    pub fn new(email: &str, password_hash: String, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            display_name,
            password_hash,
            role: UserRole::User,
            preferences: UserPreferences::default(),
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }
}

/// Public view of a user including recipe references
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id
    pub id: Uuid,
    /// Email
    pub email: String,
    /// Display name
    pub display_name: Option<String>,
    /// Role
    pub role: UserRole,
    /// Preferences
    pub preferences: UserPreferences,
    /// Active flag
    pub is_active: bool,
    /// Ids of recipes the user saved
    pub saved_recipe_ids: Vec<Uuid>,
    /// Ids of recipes the user authored
    pub created_recipe_ids: Vec<Uuid>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Build the profile view from a user and its recipe references
    #[must_use]
    pub fn from_user(user: User, saved_recipe_ids: Vec<Uuid>, created_recipe_ids: Vec<Uuid>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            preferences: user.preferences,
            is_active: user.is_active,
            saved_recipe_ids,
            created_recipe_ids,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_lowercases_email() {
        let user = User::new("  Chef@Example.COM ", "hash".into(), None);
        assert_eq!(user.email, "chef@example.com");
        assert_eq!(user.role, UserRole::User);
        assert!(user.is_active);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("a@b.io", "secret-hash".into(), None);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("chef".parse::<UserRole>().is_err());
    }
}
