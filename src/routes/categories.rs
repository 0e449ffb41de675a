// ABOUTME: Route handlers for recipe categories
// ABOUTME: Listing is public; creating and deleting require the admin role
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::auth::require_admin;
use crate::constants::limits::MAX_TITLE_LENGTH;
use crate::errors::AppError;
use crate::logging::AppLogger;
use crate::models::{slugify, Category};
use crate::resources::ServerResources;
use crate::routes::extract::{AppJson, AppPath};
use crate::routes::parse_id;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Body for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Display name, unique
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Category routes implementation
pub struct CategoryRoutes;

impl CategoryRoutes {
    /// Create all category routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/categories",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/api/categories/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let categories = resources.database.list_categories().await?;
        Ok((StatusCode::OK, Json(json!({ "categories": categories }))).into_response())
    }

    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppJson(request): AppJson<CreateCategoryRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        require_admin(&auth)?;

        let name = request.name.trim();
        if name.is_empty() || slugify(name).is_empty() {
            return Err(AppError::invalid_input(
                "Category name must contain letters or digits",
            ));
        }
        if name.chars().count() > MAX_TITLE_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Category name must be at most {MAX_TITLE_LENGTH} characters"
            )));
        }
        let description = request
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        let category = Category::new(name, description);
        resources.database.create_category(&category).await?;
        AppLogger::log_admin_action(
            &auth.user_id.to_string(),
            "create_category",
            &category.slug,
        );
        Ok((StatusCode::CREATED, Json(category)).into_response())
    }

    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        require_admin(&auth)?;

        let category_id = parse_id(&id, "category")?;
        if !resources.database.delete_category(category_id).await? {
            return Err(AppError::not_found("Category"));
        }
        AppLogger::log_admin_action(&auth.user_id.to_string(), "delete_category", &id);
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }
}
