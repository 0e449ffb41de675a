// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Each service owns one area of the recipe platform and is shared through ServerResources
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! Route handlers stay thin: they authenticate, extract the request and hand
//! off to a service. Services own validation and ownership checks so the same
//! rules apply to every entry point, including the `admin-setup` binary.

/// Registration, login and user preferences
pub mod accounts;

/// Admin dashboard, user management and cache/quota operations
pub mod admin;

/// Fridge photo analysis and natural-language recipe search
pub mod ai_search;

/// Grocery lists and meal-plan ingredient aggregation
pub mod grocery;

/// Ratings and saved recipes
pub mod interactions;

/// Weekly meal plans
pub mod meal_plans;

/// Cache-aside, quota-aware access to Spoonacular
pub mod recipe_cache;

/// Community recipes and merged search
pub mod recipes;

pub use accounts::AccountService;
pub use admin::AdminService;
pub use ai_search::AiSearchService;
pub use grocery::GroceryService;
pub use interactions::InteractionService;
pub use meal_plans::MealPlanService;
pub use recipe_cache::RecipeCacheService;
pub use recipes::RecipeService;
