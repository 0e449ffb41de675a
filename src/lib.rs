// ABOUTME: Main library entry point for the SmartPlates recipe platform server
// ABOUTME: Cached Spoonacular access, community recipes, meal plans and grocery lists over REST
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

// Crate-level attributes:
// - recursion_limit: Increased from default 128 to 256 for complex derive macros
//   (serde, thiserror) on deeply nested types like recipe documents
// - deny(unsafe_code): Zero-tolerance unsafe policy
#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # `SmartPlates` Server
//!
//! A REST API for browsing recipes, analyzing fridge photos, planning meals
//! and building grocery lists. Recipe data comes from community submissions
//! and from Spoonacular, which is accessed through a cache-aside layer with
//! outbound rate limiting and a daily quota.
//!
//! ## Architecture
//!
//! - **Cache**: bounded LRU with per-resource TTLs
//! - **Rate limiting**: fixed-window inbound limiter and Spoonacular quota
//! - **External**: the `RecipeApi` trait and its Spoonacular client
//! - **Services**: business rules shared by routes and binaries
//! - **Routes**: thin axum handlers, one module per domain
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use smartplates_server::config::environment::ServerConfig;
//! use smartplates_server::resources::ServerResources;
//! use smartplates_server::server::SmartPlatesServer;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let port = config.http_port;
//!     let resources = Arc::new(ServerResources::from_config(config).await?);
//!     SmartPlatesServer::new(resources).run(port).await
//! }
//! ```

/// JWT issuing and validation, password hashing
pub mod auth;

/// Recipe response cache
pub mod cache;

/// Environment-driven configuration
pub mod config;

/// Application constants
pub mod constants;

/// `SQLite` persistence
pub mod database;

/// Unified error handling
pub mod errors;

/// Spoonacular client and the `RecipeApi` seam
pub mod external;

/// OpenAI-compatible LLM provider for fridge analysis
pub mod llm;

/// Structured logging setup
pub mod logging;

/// HTTP middleware: authentication, CORS and rate limiting
pub mod middleware;

/// Document models
pub mod models;

/// Inbound rate limiting and Spoonacular quota
pub mod rate_limiting;

/// Shared server resources
pub mod resources;

/// REST routes
pub mod routes;

/// HTTP server bootstrap
pub mod server;

/// Domain services
pub mod services;
