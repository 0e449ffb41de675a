// ABOUTME: Route handlers for the signed-in user's preferences and recipe collections
// ABOUTME: Covers dietary preferences, saved recipes and recipes the user authored
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::AppError;
use crate::models::UserPreferences;
use crate::resources::ServerResources;
use crate::routes::extract::AppJson;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Current-user routes implementation
pub struct UserRoutes;

impl UserRoutes {
    /// Create all current-user routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/users/me/preferences",
                get(Self::handle_get_preferences).put(Self::handle_update_preferences),
            )
            .route("/api/users/me/saved-recipes", get(Self::handle_saved_recipes))
            .route("/api/users/me/recipes", get(Self::handle_my_recipes))
            .with_state(resources)
    }

    async fn handle_get_preferences(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let preferences = resources.accounts.preferences(auth.user_id).await?;
        Ok((StatusCode::OK, Json(preferences)).into_response())
    }

    async fn handle_update_preferences(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppJson(preferences): AppJson<UserPreferences>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let preferences = resources
            .accounts
            .update_preferences(auth.user_id, preferences)
            .await?;
        Ok((StatusCode::OK, Json(preferences)).into_response())
    }

    async fn handle_saved_recipes(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let recipes = resources.interactions.saved_recipes(auth.user_id).await?;
        Ok((StatusCode::OK, Json(json!({ "recipes": recipes }))).into_response())
    }

    async fn handle_my_recipes(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let recipes = resources.recipes.list_by_author(auth.user_id).await?;
        Ok((StatusCode::OK, Json(json!({ "recipes": recipes }))).into_response())
    }
}
