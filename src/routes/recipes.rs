// ABOUTME: Route handlers for recipe search, community recipe CRUD, ratings and saves
// ABOUTME: Search and lookups are public; writes require a JWT and authorship or admin role
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Recipe routes
//!
//! Search merges community recipes with cached Spoonacular results. The
//! `external/:external_id` route fetches Spoonacular details through the cache
//! and mirrors them so they can be rated, saved and planned like local ones.

use crate::constants::limits::{
    DEFAULT_AUTOCOMPLETE_RESULTS, DEFAULT_POPULAR_RECIPES, DEFAULT_RANDOM_RECIPES, MAX_PAGE_SIZE,
};
use crate::errors::AppError;
use crate::models::{RecipeInput, RecipeQuery};
use crate::resources::ServerResources;
use crate::routes::extract::{AppJson, AppPath, AppQuery};
use crate::routes::parse_id;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Query parameters for popular recipes
#[derive(Debug, Deserialize, Default)]
pub struct PopularQuery {
    /// Maximum number of recipes
    pub limit: Option<u32>,
}

/// Query parameters for random recipes
#[derive(Debug, Deserialize, Default)]
pub struct RandomQuery {
    /// Comma separated tags such as `vegetarian,dessert`
    pub tags: Option<String>,
    /// Number of recipes
    pub number: Option<u32>,
}

/// Query parameters for title autocomplete
#[derive(Debug, Deserialize, Default)]
pub struct AutocompleteQuery {
    /// Partial title
    #[serde(alias = "q")]
    pub query: Option<String>,
    /// Number of suggestions
    pub number: Option<u32>,
}

/// Body for rating a recipe
#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    /// Stars, 1 to 5
    pub rating: u8,
}

/// Recipe routes implementation
pub struct RecipeRoutes;

impl RecipeRoutes {
    /// Create all recipe routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/recipes",
                get(Self::handle_search).post(Self::handle_create),
            )
            .route("/api/recipes/popular", get(Self::handle_popular))
            .route("/api/recipes/random", get(Self::handle_random))
            .route("/api/recipes/autocomplete", get(Self::handle_autocomplete))
            .route(
                "/api/recipes/external/:external_id",
                get(Self::handle_get_external),
            )
            .route(
                "/api/recipes/:id",
                get(Self::handle_get)
                    .put(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .route("/api/recipes/:id/rating", post(Self::handle_rate))
            .route(
                "/api/recipes/:id/save",
                post(Self::handle_save).delete(Self::handle_unsave),
            )
            .with_state(resources)
    }

    async fn handle_search(
        State(resources): State<Arc<ServerResources>>,
        AppQuery(query): AppQuery<RecipeQuery>,
    ) -> Result<Response, AppError> {
        let page = resources.recipes.search(&query).await?;
        Ok((StatusCode::OK, Json(page)).into_response())
    }

    async fn handle_popular(
        State(resources): State<Arc<ServerResources>>,
        AppQuery(query): AppQuery<PopularQuery>,
    ) -> Result<Response, AppError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_POPULAR_RECIPES)
            .clamp(1, MAX_PAGE_SIZE);
        let recipes = resources.recipes.popular(limit).await?;
        Ok((StatusCode::OK, Json(json!({ "recipes": recipes }))).into_response())
    }

    async fn handle_random(
        State(resources): State<Arc<ServerResources>>,
        AppQuery(query): AppQuery<RandomQuery>,
    ) -> Result<Response, AppError> {
        let tags: Vec<String> = query
            .tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();
        let number = query.number.unwrap_or(DEFAULT_RANDOM_RECIPES);
        let recipes = resources.recipe_cache.random(&tags, number).await?;
        Ok((StatusCode::OK, Json(json!({ "recipes": recipes }))).into_response())
    }

    async fn handle_autocomplete(
        State(resources): State<Arc<ServerResources>>,
        AppQuery(query): AppQuery<AutocompleteQuery>,
    ) -> Result<Response, AppError> {
        let number = query.number.unwrap_or(DEFAULT_AUTOCOMPLETE_RESULTS);
        let suggestions = resources
            .recipe_cache
            .autocomplete(query.query.as_deref().unwrap_or_default(), number)
            .await?;
        Ok((StatusCode::OK, Json(json!({ "suggestions": suggestions }))).into_response())
    }

    async fn handle_get_external(
        State(resources): State<Arc<ServerResources>>,
        AppPath(external_id): AppPath<String>,
    ) -> Result<Response, AppError> {
        let external_id: i64 = external_id
            .parse()
            .map_err(|_| AppError::invalid_format(format!("Invalid external id: {external_id}")))?;
        let recipe = resources.recipe_cache.get_recipe(external_id).await?;
        Ok((StatusCode::OK, Json(recipe)).into_response())
    }

    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        AppPath(id): AppPath<String>,
    ) -> Result<Response, AppError> {
        let recipe_id = parse_id(&id, "recipe")?;
        let recipe = resources.recipes.get_by_id(recipe_id).await?;
        Ok((StatusCode::OK, Json(recipe)).into_response())
    }

    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppJson(input): AppJson<RecipeInput>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let recipe = resources.recipes.create(&auth, input).await?;
        Ok((StatusCode::CREATED, Json(recipe)).into_response())
    }

    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
        AppJson(input): AppJson<RecipeInput>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let recipe_id = parse_id(&id, "recipe")?;
        let recipe = resources.recipes.update(&auth, recipe_id, input).await?;
        Ok((StatusCode::OK, Json(recipe)).into_response())
    }

    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let recipe_id = parse_id(&id, "recipe")?;
        resources.recipes.delete(&auth, recipe_id).await?;
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    async fn handle_rate(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
        AppJson(body): AppJson<RatingRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let recipe_id = parse_id(&id, "recipe")?;
        let summary = resources
            .interactions
            .rate(auth.user_id, recipe_id, body.rating)
            .await?;
        Ok((StatusCode::OK, Json(summary)).into_response())
    }

    async fn handle_save(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let recipe_id = parse_id(&id, "recipe")?;
        resources.interactions.save(auth.user_id, recipe_id).await?;
        Ok((
            StatusCode::OK,
            Json(json!({ "recipe_id": recipe_id, "saved": true })),
        )
            .into_response())
    }

    async fn handle_unsave(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let recipe_id = parse_id(&id, "recipe")?;
        resources.interactions.unsave(auth.user_id, recipe_id).await?;
        Ok((
            StatusCode::OK,
            Json(json!({ "recipe_id": recipe_id, "saved": false })),
        )
            .into_response())
    }
}
