// ABOUTME: Route handlers for weekly meal plans
// ABOUTME: One plan per user and week; dates anywhere in a week address that week
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Meal plan routes
//!
//! All endpoints require JWT authentication and only ever touch the
//! caller's own plans.

use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::routes::extract::{AppJson, AppPath, AppQuery};
use crate::routes::parse_id;
use crate::services::meal_plans::{MealPlanInput, SlotUpdate};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Query parameters selecting a week
#[derive(Debug, Deserialize, Default)]
pub struct WeekQuery {
    /// Any date in the week, defaults to today
    pub week: Option<NaiveDate>,
}

/// Meal plan routes implementation
pub struct MealPlanRoutes;

impl MealPlanRoutes {
    /// Create all meal plan routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/meal-plans",
                get(Self::handle_get_week)
                    .post(Self::handle_create)
                    .put(Self::handle_upsert),
            )
            .route("/api/meal-plans/all", get(Self::handle_list))
            .route("/api/meal-plans/:id/slot", patch(Self::handle_update_slot))
            .route("/api/meal-plans/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    async fn handle_get_week(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppQuery(query): AppQuery<WeekQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let date = query.week.unwrap_or_else(|| Utc::now().date_naive());
        let plan = resources.meal_plans.get_week(auth.user_id, date).await?;
        Ok((StatusCode::OK, Json(plan)).into_response())
    }

    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let plans = resources.meal_plans.list(auth.user_id).await?;
        Ok((StatusCode::OK, Json(json!({ "meal_plans": plans }))).into_response())
    }

    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppJson(input): AppJson<MealPlanInput>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let plan = resources.meal_plans.create(auth.user_id, input).await?;
        Ok((StatusCode::CREATED, Json(plan)).into_response())
    }

    async fn handle_upsert(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppJson(input): AppJson<MealPlanInput>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let plan = resources.meal_plans.upsert_week(auth.user_id, input).await?;
        Ok((StatusCode::OK, Json(plan)).into_response())
    }

    async fn handle_update_slot(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
        AppJson(update): AppJson<SlotUpdate>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let plan_id = parse_id(&id, "meal plan")?;
        let plan = resources
            .meal_plans
            .update_slot(auth.user_id, plan_id, update)
            .await?;
        Ok((StatusCode::OK, Json(plan)).into_response())
    }

    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppPath(id): AppPath<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let plan_id = parse_id(&id, "meal plan")?;
        resources.meal_plans.delete(auth.user_id, plan_id).await?;
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }
}
