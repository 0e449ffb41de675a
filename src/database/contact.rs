// ABOUTME: Contact form database operations
// ABOUTME: Stores visitor messages and tracks which ones an admin has handled
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{parse_uuid, Database};
use crate::errors::AppResult;
use crate::models::ContactMessage;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the contact messages table
    ///
    /// # Errors
    ///
    /// Returns an error if table creation fails
    pub(super) async fn migrate_contact(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS contact_messages (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                subject TEXT,
                message TEXT NOT NULL,
                handled BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Store a contact message
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_contact_message(&self, message: &ContactMessage) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO contact_messages (id, name, email, subject, message, handled, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(message.id.to_string())
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.subject)
        .bind(&message.message)
        .bind(message.handled)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(message.id)
    }

    /// Messages newest first, optionally only those not yet handled
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt
    pub async fn list_contact_messages(&self, unhandled_only: bool) -> AppResult<Vec<ContactMessage>> {
        let sql = if unhandled_only {
            "SELECT * FROM contact_messages WHERE handled = 0 ORDER BY created_at DESC"
        } else {
            "SELECT * FROM contact_messages ORDER BY created_at DESC"
        };
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_contact_message).collect()
    }

    /// Mark a message handled, returning whether it existed
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn mark_contact_handled(&self, message_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("UPDATE contact_messages SET handled = 1 WHERE id = $1")
            .bind(message_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of messages still waiting for an admin
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_unhandled_contact_messages(&self) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM contact_messages WHERE handled = 0")
                .fetch_one(&self.pool)
                .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn row_to_contact_message(row: &SqliteRow) -> AppResult<ContactMessage> {
    let id: String = row.try_get("id")?;
    Ok(ContactMessage {
        id: parse_uuid(&id)?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        subject: row.try_get("subject")?,
        message: row.try_get("message")?,
        handled: row.try_get("handled")?,
        created_at: row.try_get("created_at")?,
    })
}
