// ABOUTME: Core types and constants for the SmartPlates recipe platform
// ABOUTME: Foundation crate with error handling, constants, and document models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # `SmartPlates` Core
//!
//! Foundation crate providing shared types and constants for the `SmartPlates`
//! recipe, meal planning and grocery platform. This crate is designed to change
//! infrequently, enabling incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and the JSON error body
//! - **constants**: Application-wide constants organized by domain
//! - **models**: Document models (User, Recipe, `MealPlan`, `GroceryList`, ...)

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants and configuration values organized by domain
pub mod constants;

/// Core document models (User, Recipe, `MealPlan`, `GroceryList`, etc.)
pub mod models;
