// ABOUTME: Route handlers for grocery lists, including generation from a meal plan
// ABOUTME: All endpoints require a JWT and only touch the caller's own lists
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::AppError;
use crate::models::GroceryItem;
use crate::resources::ServerResources;
use crate::routes::extract::{AppJson, AppPath};
use crate::routes::parse_id;
use crate::services::grocery::{GroceryListInput, GroceryListUpdate};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Body for generating a list from a meal plan
#[derive(Debug, Deserialize)]
pub struct GenerateListRequest {
    /// Source meal plan
    pub meal_plan_id: String,
    /// Optional list name
    #[serde(default)]
    pub name: Option<String>,
}

/// Grocery list routes implementation
pub struct GroceryListRoutes;

impl GroceryListRoutes {
    /// Create all grocery list routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/grocery-lists",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/api/grocery-lists/generate", post(Self::handle_generate))
            .route(
                "/api/grocery-lists/:id",
                get(Self::handle_get)
                    .put(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .route("/api/grocery-lists/:id/items", post(Self::handle_add_item))
            .route(
                "/api/grocery-lists/:id/items/:index",
                patch(Self::handle_toggle_item),
            )
            .with_state(resources)
    }

    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let lists = resources.grocery.list(auth.user_id).await?;
        Ok((StatusCode::OK, Json(json!({ "grocery_lists": lists }))).into_response())
    }

    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppJson(input): AppJson<GroceryListInput>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let list = resources.grocery.create(auth.user_id, input).await?;
        Ok((StatusCode::CREATED, Json(list)).into_response())
    }

    async fn handle_generate(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppJson(request): AppJson<GenerateListRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let plan_id = parse_id(&request.meal_plan_id, "meal plan")?;
        let list = resources
            .grocery
            .generate_from_meal_plan(auth.user_id, plan_id, request.name)
            .await?;
        Ok((StatusCode::CREATED, Json(list)).into_response())
    }

    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let list_id = parse_id(&id, "grocery list")?;
        let list = resources.grocery.get(auth.user_id, list_id).await?;
        Ok((StatusCode::OK, Json(list)).into_response())
    }

    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
        AppJson(update): AppJson<GroceryListUpdate>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let list_id = parse_id(&id, "grocery list")?;
        let list = resources
            .grocery
            .update(auth.user_id, list_id, update)
            .await?;
        Ok((StatusCode::OK, Json(list)).into_response())
    }

    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let list_id = parse_id(&id, "grocery list")?;
        resources.grocery.delete(auth.user_id, list_id).await?;
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    async fn handle_add_item(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
        AppJson(item): AppJson<GroceryItem>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let list_id = parse_id(&id, "grocery list")?;
        let list = resources
            .grocery
            .add_item(auth.user_id, list_id, item)
            .await?;
        Ok((StatusCode::OK, Json(list)).into_response())
    }

    async fn handle_toggle_item(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath((id, index)): AppPath<(String, String)>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let list_id = parse_id(&id, "grocery list")?;
        let index: usize = index
            .parse()
            .map_err(|_| AppError::invalid_format(format!("Invalid item index: {index}")))?;
        let list = resources
            .grocery
            .toggle_item(auth.user_id, list_id, index)
            .await?;
        Ok((StatusCode::OK, Json(list)).into_response())
    }
}
