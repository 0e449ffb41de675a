// ABOUTME: Recipe category database operations
// ABOUTME: Admin-managed list of browsable categories with unique names and slugs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::Category;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the categories table
    ///
    /// # Errors
    ///
    /// Returns an error if table creation fails
    pub(super) async fn migrate_categories(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                slug TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a category
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` when the name or slug is taken
    pub async fn create_category(&self, category: &Category) -> AppResult<Uuid> {
        let result = sqlx::query(
            "INSERT INTO categories (id, name, slug, description, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(category.id.to_string())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(category.id),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                AppError::already_exists(format!("Category '{}' already exists", category.name)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// All categories by name
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query("SELECT * FROM categories ORDER BY name COLLATE NOCASE")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_category).collect()
    }

    /// Delete a category
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_category(&self, category_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_category(row: &SqliteRow) -> AppResult<Category> {
    let id: String = row.try_get("id")?;
    Ok(Category {
        id: parse_uuid(&id)?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}
