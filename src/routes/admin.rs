// ABOUTME: Admin route handlers for the dashboard, user management and moderation
// ABOUTME: Also exposes the contact inbox, recipe cache controls and Spoonacular quota
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Admin routes
//!
//! Every handler authenticates the caller; the admin service then rejects
//! non-admins with 403.

use crate::constants::limits::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::routes::extract::{AppJson, AppPath, AppQuery};
use crate::routes::parse_id;
use crate::services::admin::UserUpdate;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Paging for the user list
#[derive(Debug, Deserialize, Default)]
pub struct UserListQuery {
    /// Users to skip
    #[serde(default)]
    pub offset: u32,
    /// Page size
    pub limit: Option<u32>,
}

/// Inbox filter
#[derive(Debug, Deserialize, Default)]
pub struct ContactListQuery {
    /// Only messages not yet handled
    #[serde(default)]
    pub unhandled: bool,
}

/// Which cache entries to drop
#[derive(Debug, Deserialize, Default)]
pub struct CacheClearQuery {
    /// `search` drops only search results, anything else clears everything
    pub scope: Option<String>,
}

/// Admin routes implementation
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/admin/stats", get(Self::handle_stats))
            .route("/api/admin/users", get(Self::handle_list_users))
            .route(
                "/api/admin/users/:id",
                patch(Self::handle_update_user).delete(Self::handle_delete_user),
            )
            .route("/api/admin/recipes/:id", delete(Self::handle_delete_recipe))
            .route("/api/admin/contact", get(Self::handle_list_contact))
            .route(
                "/api/admin/contact/:id/handled",
                post(Self::handle_mark_handled),
            )
            .route(
                "/api/admin/cache",
                get(Self::handle_cache_stats).delete(Self::handle_clear_cache),
            )
            .route("/api/admin/quota", get(Self::handle_quota))
            .with_state(resources)
    }

    async fn handle_stats(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let stats = resources.admin.dashboard_stats(&auth).await?;
        Ok((StatusCode::OK, Json(stats)).into_response())
    }

    async fn handle_list_users(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppQuery(query): AppQuery<UserListQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = resources
            .admin
            .list_users(&auth, query.offset, limit)
            .await?;
        Ok((StatusCode::OK, Json(page)).into_response())
    }

    async fn handle_update_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
        AppJson(update): AppJson<UserUpdate>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let user_id = parse_id(&id, "user")?;
        let user = resources.admin.update_user(&auth, user_id, update).await?;
        Ok((StatusCode::OK, Json(user)).into_response())
    }

    async fn handle_delete_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let user_id = parse_id(&id, "user")?;
        resources.admin.delete_user(&auth, user_id).await?;
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    async fn handle_delete_recipe(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let recipe_id = parse_id(&id, "recipe")?;
        resources.admin.delete_recipe(&auth, recipe_id).await?;
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    async fn handle_list_contact(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppQuery(query): AppQuery<ContactListQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let messages = resources
            .admin
            .list_contact_messages(&auth, query.unhandled)
            .await?;
        Ok((StatusCode::OK, Json(json!({ "messages": messages }))).into_response())
    }

    async fn handle_mark_handled(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let message_id = parse_id(&id, "contact message")?;
        resources.admin.mark_contact_handled(&auth, message_id).await?;
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    async fn handle_cache_stats(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let stats = resources.admin.cache_stats(&auth).await?;
        Ok((
            StatusCode::OK,
            Json(json!({ "stats": stats, "hit_rate": stats.hit_rate() })),
        )
            .into_response())
    }

    async fn handle_clear_cache(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppQuery(query): AppQuery<CacheClearQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        if query.scope.as_deref() == Some("search") {
            let removed = resources.admin.invalidate_search_cache(&auth).await?;
            return Ok((
                StatusCode::OK,
                Json(json!({ "scope": "search", "removed": removed })),
            )
                .into_response());
        }
        resources.admin.clear_cache(&auth).await?;
        Ok((StatusCode::OK, Json(json!({ "scope": "all", "cleared": true }))).into_response())
    }

    async fn handle_quota(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let report = resources.admin.quota_report(&auth).await?;
        Ok((StatusCode::OK, Json(report)).into_response())
    }
}
