// ABOUTME: Ratings and saved recipes for signed-in users
// ABOUTME: One rating per user per recipe, with running averages kept on the recipe
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::limits::{MAX_RATING, MIN_RATING};
use crate::database::Database;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::Recipe;
use serde::Serialize;
use uuid::Uuid;

/// Rating aggregate after a user rated a recipe
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    /// Rated recipe
    pub recipe_id: Uuid,
    /// Mean of all ratings
    pub average_rating: f64,
    /// Number of ratings
    pub rating_count: u32,
    /// The caller's rating
    pub your_rating: u8,
}

/// Ratings and bookmarks
#[derive(Clone)]
pub struct InteractionService {
    database: Database,
}

impl InteractionService {
    /// Create the service
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// Rate a recipe, replacing the caller's previous rating
    ///
    /// # Errors
    ///
    /// Returns 400 for a rating outside 1..=5 and 404 for an unknown recipe
    pub async fn rate(&self, user_id: Uuid, recipe_id: Uuid, rating: u8) -> AppResult<RatingSummary> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(AppError::new(
                ErrorCode::ValueOutOfRange,
                format!("Rating must be between {MIN_RATING} and {MAX_RATING}"),
            ));
        }
        self.ensure_recipe_exists(recipe_id).await?;

        let (average_rating, rating_count) =
            self.database.upsert_rating(user_id, recipe_id, rating).await?;
        Ok(RatingSummary {
            recipe_id,
            average_rating,
            rating_count,
            your_rating: rating,
        })
    }

    /// Bookmark a recipe; saving twice is a no-op
    ///
    /// # Errors
    ///
    /// Returns 404 for an unknown recipe
    pub async fn save(&self, user_id: Uuid, recipe_id: Uuid) -> AppResult<()> {
        self.ensure_recipe_exists(recipe_id).await?;
        self.database.save_recipe(user_id, recipe_id).await
    }

    /// Remove a bookmark
    ///
    /// # Errors
    ///
    /// Returns 404 when the recipe was not saved
    pub async fn unsave(&self, user_id: Uuid, recipe_id: Uuid) -> AppResult<()> {
        if self.database.unsave_recipe(user_id, recipe_id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Saved recipe"))
        }
    }

    /// The caller's bookmarks, most recent first
    ///
    /// # Errors
    ///
    /// Returns a database error
    pub async fn saved_recipes(&self, user_id: Uuid) -> AppResult<Vec<Recipe>> {
        self.database.saved_recipes(user_id).await
    }

    async fn ensure_recipe_exists(&self, recipe_id: Uuid) -> AppResult<()> {
        match self.database.get_recipe(recipe_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("Recipe")),
        }
    }
}
