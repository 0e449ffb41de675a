// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants organized by domain for the SmartPlates platform
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Application constants grouped into logical domains rather than a single
//! large file.

/// Cache-related constants (TTL, sizes, etc.)
pub mod cache;
/// Spoonacular API endpoints and quota defaults
pub mod spoonacular;
/// Validation and pagination limits
pub mod limits;

/// API endpoints
pub mod endpoints {
    /// Health check endpoint
    pub const HEALTH_CHECK: &str = "/health";
    /// Readiness endpoint
    pub const READY_CHECK: &str = "/ready";
    /// API base path
    pub const API_BASE: &str = "/api";
}

/// Network ports
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8080;
}

/// Service identification
pub mod service_names {
    /// Service name used in logs and health responses
    pub const SMARTPLATES_SERVER: &str = "smartplates-server";
    /// External recipe provider name
    pub const SPOONACULAR: &str = "spoonacular";
    /// LLM provider label used in logs
    pub const LLM: &str = "llm";
}

/// JWT constants
pub mod auth {
    /// Audience claim for issued tokens
    pub const JWT_AUDIENCE: &str = "smartplates";
    /// Default token lifetime in hours
    pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;
    /// Longest accepted token lifetime in hours (one year)
    pub const MAX_JWT_EXPIRY_HOURS: i64 = 8760;
    /// Cookie that may carry the token instead of the Authorization header
    pub const AUTH_COOKIE_NAME: &str = "auth_token";
    /// bcrypt cost factor
    pub const BCRYPT_COST: u32 = 10;
}

/// Default database location
pub mod database {
    /// Default `SQLite` URL
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/smartplates.db";
}
