// ABOUTME: Meal plan database operations
// ABOUTME: One plan per user per week, enforced by a unique (user_id, week_start) index
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{from_json, parse_uuid, to_json, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{DayPlan, MealPlan};
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the meal plans table
    ///
    /// # Errors
    ///
    /// Returns an error if table creation fails
    pub(super) async fn migrate_meal_plans(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS meal_plans (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                week_start TEXT NOT NULL,
                days TEXT NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (user_id, week_start)
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a new plan
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` when the user already has a plan for
    /// that week
    pub async fn create_meal_plan(&self, plan: &MealPlan) -> AppResult<Uuid> {
        let result = sqlx::query(
            r"
            INSERT INTO meal_plans (id, user_id, week_start, days, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(plan.id.to_string())
        .bind(plan.user_id.to_string())
        .bind(plan.week_start)
        .bind(to_json(&plan.days)?)
        .bind(&plan.notes)
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(plan.id),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::already_exists(format!(
                    "A meal plan for the week of {} already exists",
                    plan.week_start
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Insert the plan, or replace days and notes of the existing plan for
    /// the same week. Returns the stored plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn upsert_meal_plan(&self, plan: &MealPlan) -> AppResult<MealPlan> {
        sqlx::query(
            r"
            INSERT INTO meal_plans (id, user_id, week_start, days, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(user_id, week_start) DO UPDATE SET
                days = excluded.days,
                notes = excluded.notes,
                updated_at = excluded.updated_at
            ",
        )
        .bind(plan.id.to_string())
        .bind(plan.user_id.to_string())
        .bind(plan.week_start)
        .bind(to_json(&plan.days)?)
        .bind(&plan.notes)
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .execute(&self.pool)
        .await?;

        self.get_meal_plan_for_week(plan.user_id, plan.week_start)
            .await?
            .ok_or_else(|| AppError::database("Upserted meal plan not found"))
    }

    /// Persist changed days and notes
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the plan does not exist
    pub async fn update_meal_plan(&self, plan: &MealPlan) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE meal_plans SET days = $1, notes = $2, updated_at = $3 WHERE id = $4 AND user_id = $5",
        )
        .bind(to_json(&plan.days)?)
        .bind(&plan.notes)
        .bind(plan.updated_at)
        .bind(plan.id.to_string())
        .bind(plan.user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Meal plan {}", plan.id)));
        }
        Ok(())
    }

    /// A user's plan for the week starting `week_start`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt
    pub async fn get_meal_plan_for_week(
        &self,
        user_id: Uuid,
        week_start: NaiveDate,
    ) -> AppResult<Option<MealPlan>> {
        let row = sqlx::query("SELECT * FROM meal_plans WHERE user_id = $1 AND week_start = $2")
            .bind(user_id.to_string())
            .bind(week_start)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_meal_plan).transpose()
    }

    /// A plan by id, scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt
    pub async fn get_meal_plan(&self, user_id: Uuid, plan_id: Uuid) -> AppResult<Option<MealPlan>> {
        let row = sqlx::query("SELECT * FROM meal_plans WHERE id = $1 AND user_id = $2")
            .bind(plan_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_meal_plan).transpose()
    }

    /// All plans of a user, most recent week first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt
    pub async fn list_meal_plans(&self, user_id: Uuid) -> AppResult<Vec<MealPlan>> {
        let rows =
            sqlx::query("SELECT * FROM meal_plans WHERE user_id = $1 ORDER BY week_start DESC")
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(row_to_meal_plan).collect()
    }

    /// Delete a plan owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_meal_plan(&self, user_id: Uuid, plan_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM meal_plans WHERE id = $1 AND user_id = $2")
            .bind(plan_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Total number of plans
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_meal_plans(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meal_plans")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn row_to_meal_plan(row: &SqliteRow) -> AppResult<MealPlan> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let days: String = row.try_get("days")?;

    Ok(MealPlan {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        week_start: row.try_get("week_start")?,
        days: from_json::<Vec<DayPlan>>(&days)?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
