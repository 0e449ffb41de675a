// ABOUTME: HTTP middleware for authentication, CORS, and inbound rate limiting
// ABOUTME: Extracts the caller from JWT headers and guards the API with per-client windows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod auth;
pub mod cors;
pub mod rate_limiting;

// Authentication middleware
pub use auth::AuthMiddleware;

// CORS configuration
pub use cors::setup_cors;

// Rate limiting middleware and utilities
pub use rate_limiting::{client_key, create_rate_limit_headers, headers, rate_limit_middleware};
