// ABOUTME: Recipe search and local recipe management
// ABOUTME: Merges local and Spoonacular results and enforces authorship on edits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::recipe_cache::{dedup_by_external_id, RecipeCacheService};
use crate::auth::AuthResult;
use crate::database::{Database, LocalRecipeFilter};
use crate::errors::{AppError, AppResult};
use crate::models::{Recipe, RecipeInput, RecipeQuery, RecipeSummary, SearchPage};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Recipe search and CRUD
#[derive(Clone)]
pub struct RecipeService {
    database: Database,
    recipe_cache: Arc<RecipeCacheService>,
}

impl RecipeService {
    /// Create the service
    #[must_use]
    pub const fn new(database: Database, recipe_cache: Arc<RecipeCacheService>) -> Self {
        Self {
            database,
            recipe_cache,
        }
    }

    /// Search local and external recipes
    ///
    /// Stored matches come first, including mirrored Spoonacular recipes, so
    /// an upstream result already held locally is returned once with its
    /// local id. The page is filled up with external results whose offset
    /// continues where the stored matches end, and the total is the sum of
    /// both sources. When stored matches fill the page no upstream call is
    /// made and the total counts stored matches only. When the external
    /// source fails the page holds stored matches only.
    ///
    /// # Errors
    ///
    /// Returns an error if the local query fails
    pub async fn search(&self, query: &RecipeQuery) -> AppResult<SearchPage<RecipeSummary>> {
        let limit = query.effective_limit();
        let filter = LocalRecipeFilter {
            text: query.text_query().map(str::to_owned),
            cuisine: query.cuisine.clone(),
            diet: query.diet.clone(),
            max_ready_time: query.max_ready_time,
        };
        let (local, local_total) = self
            .database
            .search_local_recipes(&filter, query.offset, limit)
            .await?;

        let mut results: Vec<RecipeSummary> = local.iter().map(RecipeSummary::from).collect();
        let mut total_results = local_total;
        let remaining = limit.saturating_sub(u32::try_from(results.len()).unwrap_or(u32::MAX));

        if remaining > 0 && query.include_external && self.recipe_cache.is_enabled() {
            let mut external_query = query.clone();
            external_query.offset = query.offset.saturating_sub(local_total);
            external_query.limit = remaining;

            match self.recipe_cache.search(&external_query).await {
                Ok(page) => {
                    let seen: HashSet<i64> = results.iter().filter_map(|r| r.external_id).collect();
                    let (duplicates, fresh): (Vec<_>, Vec<_>) = page
                        .results
                        .into_iter()
                        .partition(|r| r.external_id.is_some_and(|id| seen.contains(&id)));
                    results.extend(fresh.into_iter().take(remaining as usize));
                    total_results = total_results
                        .saturating_add(page.total_results)
                        .saturating_sub(u32::try_from(duplicates.len()).unwrap_or(u32::MAX));
                }
                Err(e) => {
                    warn!(error = %e, "External recipe search failed, returning local results only");
                }
            }
        }
        dedup_by_external_id(&mut results);

        Ok(SearchPage {
            results,
            offset: query.offset,
            limit,
            total_results,
        })
    }

    /// Fetch one recipe and count the view
    ///
    /// # Errors
    ///
    /// Returns 404 when the recipe does not exist
    pub async fn get_by_id(&self, recipe_id: Uuid) -> AppResult<Recipe> {
        let mut recipe = self.find(recipe_id).await?;
        self.database.increment_view_count(recipe_id).await?;
        recipe.view_count += 1;
        Ok(recipe)
    }

    /// Create a local recipe authored by the caller
    ///
    /// # Errors
    ///
    /// Returns 400 for invalid input or a database error
    pub async fn create(&self, auth: &AuthResult, input: RecipeInput) -> AppResult<Recipe> {
        input.validate()?;
        let recipe = input.into_recipe(auth.user_id);
        self.database.create_recipe(&recipe).await?;
        info!(recipe_id = %recipe.id, author = %auth.user_id, "Recipe created");
        Ok(recipe)
    }

    /// Replace a recipe's editable fields
    ///
    /// # Errors
    ///
    /// Returns 404 when missing, 403 unless the caller is the author or an
    /// admin, 400 for invalid input
    pub async fn update(
        &self,
        auth: &AuthResult,
        recipe_id: Uuid,
        input: RecipeInput,
    ) -> AppResult<Recipe> {
        let mut recipe = self.find(recipe_id).await?;
        ensure_can_modify(&recipe, auth)?;
        input.validate()?;

        input.apply_to(&mut recipe);
        self.database.update_recipe(&recipe).await?;
        Ok(recipe)
    }

    /// Delete a recipe
    ///
    /// # Errors
    ///
    /// Returns 404 when missing and 403 unless the caller is the author or an admin
    pub async fn delete(&self, auth: &AuthResult, recipe_id: Uuid) -> AppResult<()> {
        let recipe = self.find(recipe_id).await?;
        ensure_can_modify(&recipe, auth)?;

        self.database.delete_recipe(recipe_id).await?;
        info!(recipe_id = %recipe_id, by = %auth.user_id, "Recipe deleted");
        Ok(())
    }

    /// Recipes written by a user
    ///
    /// # Errors
    ///
    /// Returns a database error
    pub async fn list_by_author(&self, author_id: Uuid) -> AppResult<Vec<Recipe>> {
        self.database.list_recipes_by_author(author_id).await
    }

    /// Best rated local recipes, views breaking ties
    ///
    /// # Errors
    ///
    /// Returns a database error
    pub async fn popular(&self, limit: u32) -> AppResult<Vec<RecipeSummary>> {
        let recipes = self.database.popular_recipes(limit).await?;
        Ok(recipes.iter().map(RecipeSummary::from).collect())
    }

    async fn find(&self, recipe_id: Uuid) -> AppResult<Recipe> {
        self.database
            .get_recipe(recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))
    }
}

fn ensure_can_modify(recipe: &Recipe, auth: &AuthResult) -> AppResult<()> {
    if recipe.can_modify(auth.user_id, auth.role) {
        Ok(())
    } else {
        Err(AppError::permission_denied(
            "Only the author or an admin can modify this recipe",
        ))
    }
}
