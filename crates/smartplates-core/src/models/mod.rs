// ABOUTME: Core document models for the SmartPlates platform
// ABOUTME: Re-exports User, Recipe, MealPlan, GroceryList, Category and ContactMessage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Documents persisted by the server and returned by the REST API.
//!
//! ## Core Models
//!
//! - `User`: account, role and dietary preferences
//! - `Recipe`: locally authored or mirrored from Spoonacular
//! - `MealPlan`: one week of breakfast/lunch/dinner/snacks slots
//! - `GroceryList`: shopping items, optionally generated from a meal plan
//! - `Category`: admin-curated recipe categories
//! - `ContactMessage`: contact form submissions

mod category;
mod contact;
mod grocery;
mod meal_plan;
mod recipe;
mod user;

// Category domain
pub use category::{slugify, Category};

// Contact domain
pub use contact::ContactMessage;

// Grocery domain
pub use grocery::{GroceryItem, GroceryList};

// Meal plan domain
pub use meal_plan::{week_monday, DayPlan, MealPlan, MealRef, MealType, DAYS_PER_WEEK};

// Recipe domain
pub use recipe::{
    ExternalRecipe, Ingredient, IngredientMatch, NutritionInfo, Recipe, RecipeInput,
    RecipeOrigin, RecipeQuery, RecipeSource, RecipeSummary, SearchPage,
};

// User domain
pub use user::{User, UserPreferences, UserProfile, UserRole};
