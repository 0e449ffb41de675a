// ABOUTME: Route module organization for SmartPlates HTTP endpoints
// ABOUTME: Provides centralized route definitions organized by domain with thin handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the `SmartPlates` server
//!
//! Each domain module contains only route definitions and thin handler
//! functions that authenticate the caller and delegate to the service layer.

/// Admin dashboard, moderation and cache/quota routes
pub mod admin;
/// Fridge analysis and natural-language search routes
pub mod ai;
/// Registration, login and session routes
pub mod auth;
/// Recipe category routes
pub mod categories;
/// Contact form routes
pub mod contact;
/// Extractors that reject with JSON error bodies
pub mod extract;
/// Grocery list routes
pub mod grocery_lists;
/// Health check and readiness routes
pub mod health;
/// Weekly meal plan routes
pub mod meal_plans;
/// Recipe search, CRUD, rating and saving routes
pub mod recipes;
/// Current-user routes
pub mod users;

pub use admin::AdminRoutes;
pub use ai::AiRoutes;
pub use auth::AuthRoutes;
pub use categories::CategoryRoutes;
pub use contact::ContactRoutes;
pub use grocery_lists::GroceryListRoutes;
pub use health::HealthRoutes;
pub use meal_plans::MealPlanRoutes;
pub use recipes::RecipeRoutes;
pub use users::UserRoutes;

use crate::errors::{AppError, AppResult};
use crate::resources::ServerResources;
use axum::Router;
use std::sync::Arc;
use uuid::Uuid;

/// Merge every domain router into one
pub fn api_router(resources: &Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(RecipeRoutes::routes(resources.clone()))
        .merge(AiRoutes::routes(resources.clone()))
        .merge(MealPlanRoutes::routes(resources.clone()))
        .merge(GroceryListRoutes::routes(resources.clone()))
        .merge(UserRoutes::routes(resources.clone()))
        .merge(CategoryRoutes::routes(resources.clone()))
        .merge(ContactRoutes::routes(resources.clone()))
        .merge(AdminRoutes::routes(resources.clone()))
}

/// Parse a path id, answering 400 with a JSON body instead of axum's plain text
pub(crate) fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::invalid_format(format!("Invalid {what} id: {raw}")))
}
