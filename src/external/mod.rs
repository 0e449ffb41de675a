// ABOUTME: External recipe API abstraction and its Spoonacular implementation
// ABOUTME: The RecipeApi trait is the seam between the cache layer and upstream

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! External API Clients
//!
//! Every call returns its payload together with the quota points it cost, so
//! the cache layer can account for usage without knowing the upstream pricing.

pub mod mock;
pub mod spoonacular_client;

pub use mock::MockRecipeApi;
pub use spoonacular_client::SpoonacularClient;

use crate::errors::AppResult;
use crate::models::{ExternalRecipe, IngredientMatch, RecipeQuery, RecipeSummary, SearchPage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Upstream payload plus the quota points the call consumed
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    /// Decoded payload
    pub data: T,
    /// Points charged by the upstream for this call
    pub quota_cost: u32,
}

impl<T> ApiResponse<T> {
    /// Wrap a payload with its cost
    pub const fn new(data: T, quota_cost: u32) -> Self {
        Self { data, quota_cost }
    }
}

/// Title suggestion from the autocomplete endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeSuggestion {
    /// Spoonacular id
    pub external_id: i64,
    /// Recipe title
    pub title: String,
}

/// Operations the platform needs from a third-party recipe source
#[async_trait]
pub trait RecipeApi: Send + Sync {
    /// Search recipes with filters and paging
    async fn search_recipes(
        &self,
        query: &RecipeQuery,
    ) -> AppResult<ApiResponse<SearchPage<RecipeSummary>>>;

    /// Full details of one recipe
    async fn get_recipe(&self, external_id: i64) -> AppResult<ApiResponse<ExternalRecipe>>;

    /// Recipes that use the given ingredients
    async fn find_by_ingredients(
        &self,
        ingredients: &[String],
        number: u32,
    ) -> AppResult<ApiResponse<Vec<IngredientMatch>>>;

    /// Random recipes, optionally restricted by tags (diets, cuisines, dish types)
    async fn random_recipes(
        &self,
        tags: &[String],
        number: u32,
    ) -> AppResult<ApiResponse<Vec<RecipeSummary>>>;

    /// Title completions for a partial query
    async fn autocomplete(
        &self,
        query: &str,
        number: u32,
    ) -> AppResult<ApiResponse<Vec<RecipeSuggestion>>>;
}
