// ABOUTME: Cache-related constants for TTL, capacity, and cleanup intervals
// ABOUTME: Defaults for the in-memory recipe cache in front of Spoonacular
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Default maximum cache entries for in-memory cache
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

/// Default cleanup interval in seconds for expired entries
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300; // 5 minutes

/// Recipe search cache TTL (1 hour)
pub const TTL_RECIPE_SEARCH_SECS: u64 = 3_600;

/// Recipe details cache TTL (24 hours) - upstream recipes rarely change
pub const TTL_RECIPE_DETAILS_SECS: u64 = 86_400;

/// Random recipes cache TTL (15 minutes) - keep the feed rotating
pub const TTL_RANDOM_RECIPES_SECS: u64 = 900;

/// Autocomplete cache TTL (6 hours)
pub const TTL_AUTOCOMPLETE_SECS: u64 = 21_600;

/// Namespace prefix shared by every recipe cache key
pub const RECIPE_CACHE_NAMESPACE: &str = "recipes";
