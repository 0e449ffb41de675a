// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Re-exports the environment-driven ServerConfig and its sections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module for the `SmartPlates` server
//!
//! All settings come from environment variables (optionally via `.env`),
//! see [`environment::ServerConfig::from_env`].

/// Environment and server configuration
pub mod environment;

pub use environment::{
    AdminConfig, AuthConfig, CacheSettings, CorsConfig, DatabaseConfig, Environment, LlmConfig,
    RateLimitConfig, ServerConfig, SpoonacularConfig,
};
