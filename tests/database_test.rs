// ABOUTME: Tests for the file-backed SQLite database
// ABOUTME: Verifies directory creation, persistence across reopen and unique constraints
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use anyhow::Result;
use chrono::Utc;
use smartplates_server::database::Database;
use smartplates_server::models::User;
use smartplates_server::services::RecipeCacheService;
use tempfile::TempDir;

#[tokio::test]
async fn test_file_database_creates_directory_and_persists() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("nested").join("smartplates.db");
    let url = format!("sqlite:{}", path.display());

    let user = User::new("Persist@Example.com", "hash".to_owned(), None);
    {
        let database = Database::new(&url).await?;
        database.create_user(&user).await?;
        database
            .record_api_usage(Utc::now().date_naive(), "/recipes/complexSearch", 5)
            .await?;
        database.health_check().await?;
    }
    assert!(path.exists());

    // Migrations are idempotent and data survives a reopen
    let reopened = Database::new(&url).await?;
    let stored = reopened
        .get_user_by_email("persist@example.com")
        .await?
        .expect("user persisted");
    assert_eq!(stored.id, user.id);

    let quota = RecipeCacheService::restore_quota(&reopened, 150).await?;
    assert_eq!(quota.status().used, 5);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_is_rejected_by_the_store() -> Result<()> {
    let dir = TempDir::new()?;
    let url = format!("sqlite:{}", dir.path().join("dup.db").display());
    let database = Database::new(&url).await?;

    database
        .create_user(&User::new("same@example.com", "hash".to_owned(), None))
        .await?;
    let second = database
        .create_user(&User::new("same@example.com", "hash".to_owned(), None))
        .await;
    assert!(second.is_err());
    Ok(())
}
