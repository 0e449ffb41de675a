// ABOUTME: User account database operations
// ABOUTME: Registration, lookup, preferences, role and activation management
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{from_json, parse_uuid, to_json, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserPreferences, UserRole};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the users table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                display_name TEXT,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
                preferences TEXT NOT NULL DEFAULT '{}',
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                last_login TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a new user
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` when the email is taken
    pub async fn create_user(&self, user: &User) -> AppResult<Uuid> {
        let result = sqlx::query(
            r"
            INSERT INTO users (id, email, display_name, password_hash, role, preferences,
                               is_active, created_at, updated_at, last_login)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(to_json(&user.preferences)?)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.last_login)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user.id),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                AppError::already_exists(format!("Email {} is already registered", user.email)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Get a user by email (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Page through all users, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_users(&self, offset: u32, limit: u32) -> AppResult<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_user).collect()
    }

    /// Total number of users
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_users(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Replace a user's preferences
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the user does not exist
    pub async fn update_user_preferences(
        &self,
        user_id: Uuid,
        preferences: &UserPreferences,
    ) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE users SET preferences = $1, updated_at = $2 WHERE id = $3")
                .bind(to_json(preferences)?)
                .bind(Utc::now())
                .bind(user_id.to_string())
                .execute(&self.pool)
                .await?;
        require_affected(result.rows_affected(), user_id)
    }

    /// Change a user's role
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the user does not exist
    pub async fn update_user_role(&self, user_id: Uuid, role: UserRole) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET role = $1, updated_at = $2 WHERE id = $3")
            .bind(role.as_str())
            .bind(Utc::now())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        require_affected(result.rows_affected(), user_id)
    }

    /// Activate or deactivate a user
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the user does not exist
    pub async fn set_user_active(&self, user_id: Uuid, is_active: bool) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = $1, updated_at = $2 WHERE id = $3")
            .bind(is_active)
            .bind(Utc::now())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        require_affected(result.rows_affected(), user_id)
    }

    /// Replace the stored password hash
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the user does not exist
    pub async fn update_user_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
                .bind(password_hash)
                .bind(Utc::now())
                .bind(user_id.to_string())
                .execute(&self.pool)
                .await?;
        require_affected(result.rows_affected(), user_id)
    }

    /// Stamp a successful login
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn update_last_login(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a user together with their plans, lists, ratings and recipes
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_user(&self, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn require_affected(rows: u64, user_id: Uuid) -> AppResult<()> {
    if rows == 0 {
        return Err(AppError::not_found(format!("User {user_id}")));
    }
    Ok(())
}

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let id: String = row.try_get("id")?;
    let role: String = row.try_get("role")?;
    let preferences: String = row.try_get("preferences")?;

    Ok(User {
        id: parse_uuid(&id)?,
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        password_hash: row.try_get("password_hash")?,
        role: role.parse()?,
        preferences: from_json::<UserPreferences>(&preferences)?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        last_login: row.try_get("last_login")?,
    })
}
