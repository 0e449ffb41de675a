// ABOUTME: Spoonacular API endpoints, quota defaults, and request limits
// ABOUTME: Used by the HTTP client and the daily quota tracker
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Default Spoonacular API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";

/// Free plan daily point allowance
pub const DEFAULT_DAILY_QUOTA_POINTS: u32 = 150;

/// Default outbound request budget per minute
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Response header carrying the point cost of the request
pub const QUOTA_REQUEST_HEADER: &str = "x-api-quota-request";

/// Rate limiter key for outbound Spoonacular traffic
pub const OUTBOUND_LIMITER_KEY: &str = "spoonacular";

/// Complex search endpoint
pub const ENDPOINT_COMPLEX_SEARCH: &str = "/recipes/complexSearch";
/// Recipe information endpoint (id substituted)
pub const ENDPOINT_RECIPE_INFORMATION: &str = "/recipes/{id}/information";
/// Find by ingredients endpoint
pub const ENDPOINT_FIND_BY_INGREDIENTS: &str = "/recipes/findByIngredients";
/// Random recipes endpoint
pub const ENDPOINT_RANDOM: &str = "/recipes/random";
/// Autocomplete endpoint
pub const ENDPOINT_AUTOCOMPLETE: &str = "/recipes/autocomplete";

/// Maximum results per upstream request
pub const MAX_RESULTS_PER_REQUEST: u32 = 100;
