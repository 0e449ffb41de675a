// ABOUTME: Grocery list database operations
// ABOUTME: Saved shopping lists with their items stored as a JSON document
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{from_json, parse_uuid, to_json, Database};
use crate::errors::{AppError, AppResult};
use crate::models::GroceryList;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the grocery lists table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_grocery_lists(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS grocery_lists (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                meal_plan_id TEXT REFERENCES meal_plans(id) ON DELETE SET NULL,
                items TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_grocery_lists_user ON grocery_lists(user_id)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert a grocery list
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_grocery_list(&self, list: &GroceryList) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO grocery_lists (id, user_id, name, meal_plan_id, items, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(list.id.to_string())
        .bind(list.user_id.to_string())
        .bind(&list.name)
        .bind(list.meal_plan_id.map(|id| id.to_string()))
        .bind(to_json(&list.items)?)
        .bind(list.created_at)
        .bind(list.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(list.id)
    }

    /// Persist name and items
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the list does not exist
    pub async fn update_grocery_list(&self, list: &GroceryList) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE grocery_lists SET name = $1, items = $2, updated_at = $3 WHERE id = $4 AND user_id = $5",
        )
        .bind(&list.name)
        .bind(to_json(&list.items)?)
        .bind(list.updated_at)
        .bind(list.id.to_string())
        .bind(list.user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Grocery list {}", list.id)));
        }
        Ok(())
    }

    /// A list by id, scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt
    pub async fn get_grocery_list(
        &self,
        user_id: Uuid,
        list_id: Uuid,
    ) -> AppResult<Option<GroceryList>> {
        let row = sqlx::query("SELECT * FROM grocery_lists WHERE id = $1 AND user_id = $2")
            .bind(list_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_grocery_list).transpose()
    }

    /// All lists of a user, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt
    pub async fn list_grocery_lists(&self, user_id: Uuid) -> AppResult<Vec<GroceryList>> {
        let rows = sqlx::query(
            "SELECT * FROM grocery_lists WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_grocery_list).collect()
    }

    /// Delete a list owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_grocery_list(&self, user_id: Uuid, list_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM grocery_lists WHERE id = $1 AND user_id = $2")
            .bind(list_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Total number of lists
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_grocery_lists(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM grocery_lists")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn row_to_grocery_list(row: &SqliteRow) -> AppResult<GroceryList> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let meal_plan_id: Option<String> = row.try_get("meal_plan_id")?;
    let items: String = row.try_get("items")?;

    Ok(GroceryList {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        name: row.try_get("name")?,
        meal_plan_id: meal_plan_id.as_deref().map(parse_uuid).transpose()?,
        items: from_json(&items)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
