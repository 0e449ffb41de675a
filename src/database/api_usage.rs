// ABOUTME: Spoonacular usage ledger database operations
// ABOUTME: One row per upstream call so the daily quota survives restarts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{to_u32, Database};
use crate::errors::AppResult;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

/// Aggregated upstream usage for one UTC day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyApiUsage {
    /// UTC day
    pub day: NaiveDate,
    /// Number of upstream calls
    pub requests: u32,
    /// Quota points consumed
    pub points: u32,
}

impl Database {
    /// Create the api usage table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_api_usage(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS api_usage (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                day TEXT NOT NULL,
                endpoint TEXT NOT NULL,
                points INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_api_usage_day ON api_usage(day)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Append one upstream call to the ledger
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn record_api_usage(&self, day: NaiveDate, endpoint: &str, points: u32) -> AppResult<()> {
        sqlx::query("INSERT INTO api_usage (day, endpoint, points, created_at) VALUES ($1, $2, $3, $4)")
            .bind(day)
            .bind(endpoint)
            .bind(i64::from(points))
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Points consumed on `day`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn api_points_for_day(&self, day: NaiveDate) -> AppResult<u32> {
        let points: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(points), 0) FROM api_usage WHERE day = $1")
                .bind(day)
                .fetch_one(&self.pool)
                .await?;
        Ok(to_u32(points))
    }

    /// Per-day usage for the last `days` days up to `today`, oldest first
    ///
    /// Days without calls are omitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn api_usage_history(&self, today: NaiveDate, days: i64) -> AppResult<Vec<DailyApiUsage>> {
        let since = today - Duration::days(days.max(1) - 1);
        let rows = sqlx::query(
            r"
            SELECT day, COUNT(*) AS requests, COALESCE(SUM(points), 0) AS points
            FROM api_usage
            WHERE day >= $1 AND day <= $2
            GROUP BY day
            ORDER BY day
            ",
        )
        .bind(since)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> AppResult<DailyApiUsage> {
                let requests: i64 = row.try_get("requests")?;
                let points: i64 = row.try_get("points")?;
                Ok(DailyApiUsage {
                    day: row.try_get("day")?,
                    requests: to_u32(requests),
                    points: to_u32(points),
                })
            })
            .collect()
    }
}
