// ABOUTME: System-wide constants re-exported from the core crate
// ABOUTME: Cache TTLs, Spoonacular endpoints, limits, and service names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Constants Module
//!
//! Application constants organized by domain, defined in `smartplates-core`.

pub use smartplates_core::constants::*;
