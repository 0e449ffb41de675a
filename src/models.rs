// ABOUTME: Document models re-exported from the core crate
// ABOUTME: User, Recipe, MealPlan, GroceryList, Category and ContactMessage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Defined in `smartplates-core` and shared by the database layer, services
//! and routes.

pub use smartplates_core::models::*;
