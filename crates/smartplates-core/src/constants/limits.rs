// ABOUTME: Validation and pagination limits shared by services and routes
// ABOUTME: Centralizes bounds so handlers and tests agree on them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum page size for list endpoints
pub const MAX_PAGE_SIZE: u32 = 100;

/// Minimum password length at registration
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Lowest allowed recipe rating
pub const MIN_RATING: u8 = 1;

/// Highest allowed recipe rating
pub const MAX_RATING: u8 = 5;

/// Maximum recipe title length
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum contact message length
pub const MAX_CONTACT_MESSAGE_LENGTH: usize = 5_000;

/// Default number of recipes suggested from fridge contents
pub const DEFAULT_FRIDGE_RESULTS: u32 = 10;

/// Default number of random recipes
pub const DEFAULT_RANDOM_RECIPES: u32 = 10;

/// Default number of autocomplete suggestions
pub const DEFAULT_AUTOCOMPLETE_RESULTS: u32 = 8;

/// Default number of popular recipes
pub const DEFAULT_POPULAR_RECIPES: u32 = 12;

/// Days of usage history returned by the quota endpoint
pub const QUOTA_HISTORY_DAYS: i64 = 7;
