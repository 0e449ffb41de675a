// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Loads .env, reads environment variables with defaults, and summarizes the result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management

use crate::cache::{CacheConfig, CacheTtlConfig};
use crate::constants::{auth, cache, database, ports, spoonacular};
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: database::DEFAULT_DATABASE_URL.to_owned(),
        }
    }
}

/// Token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret; a random one is generated at startup when absent
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    /// Token lifetime
    pub jwt_expiry_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiry_hours: auth::DEFAULT_JWT_EXPIRY_HOURS,
        }
    }
}

/// Spoonacular client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoonacularConfig {
    /// API key; external lookups are disabled without one
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Daily point allowance
    pub daily_quota: u32,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl SpoonacularConfig {
    /// Whether an API key is configured
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for SpoonacularConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: spoonacular::DEFAULT_BASE_URL.to_owned(),
            daily_quota: spoonacular::DEFAULT_DAILY_QUOTA_POINTS,
            request_timeout_secs: spoonacular::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Recipe cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// LRU capacity
    pub max_entries: usize,
    /// Expired entry sweep interval
    pub cleanup_interval_secs: u64,
    /// Search TTL
    pub search_ttl_secs: u64,
    /// Details TTL
    pub details_ttl_secs: u64,
    /// Random recipes TTL
    pub random_ttl_secs: u64,
    /// Autocomplete TTL
    pub autocomplete_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: cache::DEFAULT_CACHE_MAX_ENTRIES,
            cleanup_interval_secs: cache::DEFAULT_CLEANUP_INTERVAL_SECS,
            search_ttl_secs: cache::TTL_RECIPE_SEARCH_SECS,
            details_ttl_secs: cache::TTL_RECIPE_DETAILS_SECS,
            random_ttl_secs: cache::TTL_RANDOM_RECIPES_SECS,
            autocomplete_ttl_secs: cache::TTL_AUTOCOMPLETE_SECS,
        }
    }
}

impl CacheSettings {
    /// Build the cache backend configuration
    #[must_use]
    pub fn to_cache_config(&self, enable_background_cleanup: bool) -> CacheConfig {
        CacheConfig {
            max_entries: self.max_entries,
            cleanup_interval: Duration::from_secs(self.cleanup_interval_secs),
            enable_background_cleanup,
            ttl: CacheTtlConfig {
                search_secs: self.search_ttl_secs,
                details_secs: self.details_ttl_secs,
                random_secs: self.random_ttl_secs,
                autocomplete_secs: self.autocomplete_ttl_secs,
            },
        }
    }
}

/// Inbound and outbound rate limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Apply the inbound limiter
    pub enabled: bool,
    /// Inbound requests per window and client
    pub requests_per_window: u32,
    /// Inbound window length
    pub window_secs: u64,
    /// Outbound Spoonacular requests per minute
    pub external_requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_window: 60,
            window_secs: 60,
            external_requests_per_minute: spoonacular::DEFAULT_REQUESTS_PER_MINUTE,
        }
    }
}

/// CORS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins, `*` for any
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_owned()],
        }
    }
}

/// Vision LLM used for fridge analysis and natural-language search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Whether AI features call the model
    pub enabled: bool,
    /// OpenAI-compatible base URL
    pub base_url: String,
    /// Bearer key
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Vision-capable model name
    pub model: String,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com/v1".to_owned(),
            api_key: None,
            model: "gpt-4o-mini".to_owned(),
            request_timeout_secs: 60,
        }
    }
}

/// Bootstrap admin credentials used by `admin-setup`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Admin email
    pub email: Option<String>,
    /// Admin password
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Database
    pub database: DatabaseConfig,
    /// Tokens
    pub auth: AuthConfig,
    /// Spoonacular
    pub spoonacular: SpoonacularConfig,
    /// Recipe cache
    pub cache: CacheSettings,
    /// Rate limits
    pub rate_limit: RateLimitConfig,
    /// CORS
    pub cors: CorsConfig,
    /// LLM
    pub llm: LlmConfig,
    /// Admin bootstrap
    pub admin: AdminConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: ports::DEFAULT_HTTP_PORT,
            environment: Environment::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            spoonacular: SpoonacularConfig::default(),
            cache: CacheSettings::default(),
            rate_limit: RateLimitConfig::default(),
            cors: CorsConfig::default(),
            llm: LlmConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let defaults = Self::default();
        let llm_api_key = env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty());

        Ok(Self {
            http_port: env_parse("HTTP_PORT", defaults.http_port)?,
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
            database: DatabaseConfig {
                url: env_var_or("DATABASE_URL", &defaults.database.url),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
                jwt_expiry_hours: jwt_expiry_hours(env_parse(
                    "JWT_EXPIRY_HOURS",
                    defaults.auth.jwt_expiry_hours,
                )?)?,
            },
            spoonacular: SpoonacularConfig {
                api_key: env::var("SPOONACULAR_API_KEY")
                    .ok()
                    .filter(|k| !k.is_empty()),
                base_url: env_var_or("SPOONACULAR_BASE_URL", &defaults.spoonacular.base_url),
                daily_quota: env_parse(
                    "SPOONACULAR_DAILY_QUOTA",
                    defaults.spoonacular.daily_quota,
                )?,
                request_timeout_secs: env_parse(
                    "SPOONACULAR_TIMEOUT_SECS",
                    defaults.spoonacular.request_timeout_secs,
                )?,
            },
            cache: CacheSettings {
                max_entries: env_parse("CACHE_MAX_ENTRIES", defaults.cache.max_entries)?,
                cleanup_interval_secs: env_parse(
                    "CACHE_CLEANUP_INTERVAL_SECS",
                    defaults.cache.cleanup_interval_secs,
                )?,
                search_ttl_secs: env_parse("CACHE_SEARCH_TTL_SECS", defaults.cache.search_ttl_secs)?,
                details_ttl_secs: env_parse(
                    "CACHE_DETAILS_TTL_SECS",
                    defaults.cache.details_ttl_secs,
                )?,
                random_ttl_secs: env_parse("CACHE_RANDOM_TTL_SECS", defaults.cache.random_ttl_secs)?,
                autocomplete_ttl_secs: env_parse(
                    "CACHE_AUTOCOMPLETE_TTL_SECS",
                    defaults.cache.autocomplete_ttl_secs,
                )?,
            },
            rate_limit: RateLimitConfig {
                enabled: env_parse("RATE_LIMIT_ENABLED", defaults.rate_limit.enabled)?,
                requests_per_window: env_parse(
                    "RATE_LIMIT_REQUESTS",
                    defaults.rate_limit.requests_per_window,
                )?,
                window_secs: env_parse("RATE_LIMIT_WINDOW_SECS", defaults.rate_limit.window_secs)?,
                external_requests_per_minute: env_parse(
                    "SPOONACULAR_REQUESTS_PER_MINUTE",
                    defaults.rate_limit.external_requests_per_minute,
                )?,
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(&env_var_or("CORS_ORIGINS", "*")),
            },
            llm: LlmConfig {
                enabled: env_parse("LLM_ENABLED", llm_api_key.is_some())?,
                base_url: env_var_or("LLM_BASE_URL", &defaults.llm.base_url),
                api_key: llm_api_key,
                model: env_var_or("LLM_MODEL", &defaults.llm.model),
                request_timeout_secs: env_parse(
                    "LLM_TIMEOUT_SECS",
                    defaults.llm.request_timeout_secs,
                )?,
            },
            admin: AdminConfig {
                email: env::var("ADMIN_EMAIL").ok().filter(|e| !e.is_empty()),
                password: env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
            },
        })
    }

    /// Defaults suitable for tests: in-memory database, no upstream, no LLM
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            http_port: 0,
            environment: Environment::Testing,
            database: DatabaseConfig {
                url: "sqlite::memory:".to_owned(),
            },
            auth: AuthConfig {
                jwt_secret: Some("test-secret-for-smartplates-tokens".to_owned()),
                ..AuthConfig::default()
            },
            ..Self::default()
        }
    }

    /// Secret-free multi-line summary for startup logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "SmartPlates Server Configuration:\n\
             - HTTP Port: {}\n\
             - Environment: {}\n\
             - Database: {}\n\
             - Spoonacular: {} (daily quota {} points)\n\
             - Cache: {} entries, search TTL {}s, details TTL {}s\n\
             - Rate Limiting: {} ({} requests / {}s)\n\
             - LLM: {}\n\
             - CORS Origins: {}",
            self.http_port,
            self.environment,
            redact_database_url(&self.database.url),
            if self.spoonacular.is_enabled() {
                "Enabled"
            } else {
                "Disabled"
            },
            self.spoonacular.daily_quota,
            self.cache.max_entries,
            self.cache.search_ttl_secs,
            self.cache.details_ttl_secs,
            if self.rate_limit.enabled {
                "Enabled"
            } else {
                "Disabled"
            },
            self.rate_limit.requests_per_window,
            self.rate_limit.window_secs,
            if self.llm.enabled {
                self.llm.model.as_str()
            } else {
                "Disabled"
            },
            self.cors.allowed_origins.join(", "),
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        _ => Ok(default),
    }
}

/// Token lifetimes must be between one hour and one year
fn jwt_expiry_hours(hours: i64) -> Result<i64> {
    ensure!(
        (1..=auth::MAX_JWT_EXPIRY_HOURS).contains(&hours),
        "Invalid JWT_EXPIRY_HOURS value: {hours} (expected 1..={})",
        auth::MAX_JWT_EXPIRY_HOURS
    );
    Ok(hours)
}

/// Parse comma-separated CORS origins
fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str.trim() == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Strip credentials from a database URL
fn redact_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("http://a.test, http://b.test,"),
            vec!["http://a.test", "http://b.test"]
        );
    }

    #[test]
    fn test_redact_database_url() {
        assert_eq!(
            redact_database_url("postgres://user:pw@db:5432/app"),
            "postgres://***@db:5432/app"
        );
        assert_eq!(redact_database_url("sqlite::memory:"), "sqlite::memory:");
    }

    #[test]
    #[serial]
    fn test_from_env_reads_overrides() {
        env::set_var("HTTP_PORT", "9191");
        env::set_var("SPOONACULAR_DAILY_QUOTA", "500");
        env::set_var("SPOONACULAR_API_KEY", "k");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, 9191);
        assert_eq!(config.spoonacular.daily_quota, 500);
        assert!(config.spoonacular.is_enabled());
        assert!(!config.summary().contains("\"k\""));

        env::remove_var("HTTP_PORT");
        env::remove_var("SPOONACULAR_DAILY_QUOTA");
        env::remove_var("SPOONACULAR_API_KEY");
    }

    #[test]
    #[serial]
    fn test_jwt_expiry_must_be_in_range() {
        env::set_var("JWT_EXPIRY_HOURS", "9223372036854775807");
        assert!(ServerConfig::from_env().is_err());
        env::set_var("JWT_EXPIRY_HOURS", "0");
        assert!(ServerConfig::from_env().is_err());
        env::set_var("JWT_EXPIRY_HOURS", "48");
        assert_eq!(ServerConfig::from_env().unwrap().auth.jwt_expiry_hours, 48);
        env::remove_var("JWT_EXPIRY_HOURS");
    }

    #[test]
    #[serial]
    fn test_invalid_number_is_an_error() {
        env::set_var("CACHE_MAX_ENTRIES", "lots");
        assert!(ServerConfig::from_env().is_err());
        env::remove_var("CACHE_MAX_ENTRIES");
    }
}
