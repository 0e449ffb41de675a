// ABOUTME: Centralized resource container for dependency injection in the HTTP server
// ABOUTME: Builds the database, cache, auth and domain services once and shares them via Arc
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Server Resources Module
//!
// NOTE: All `.clone()` calls in this file are Safe - they are necessary for:
// - Arc sharing of expensive resources (database pool, cache, services) across handlers
// - Resource ownership transfers for dependency injection
//!
//! Centralized resource container for dependency injection.
//! Route handlers receive `Arc<ServerResources>` as axum state.

use crate::auth::{generate_jwt_secret, AuthManager};
use crate::cache::factory::Cache;
use crate::config::environment::ServerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::external::{RecipeApi, SpoonacularClient};
use crate::llm::{LlmProvider, OpenAiCompatibleProvider};
use crate::middleware::AuthMiddleware;
use crate::rate_limiting::FixedWindowRateLimiter;
use crate::services::{
    AccountService, AdminService, AiSearchService, GroceryService, InteractionService,
    MealPlanService, RecipeCacheService, RecipeService,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// `SQLite` pool
    pub database: Database,
    /// Recipe response cache
    pub cache: Cache,
    /// JWT issuing and validation
    pub auth_manager: Arc<AuthManager>,
    /// Request authentication
    pub auth_middleware: Arc<AuthMiddleware>,
    /// Inbound limiter, `None` when rate limiting is disabled
    pub inbound_limiter: Option<Arc<FixedWindowRateLimiter>>,
    /// Vision/chat model, `None` when AI features are disabled
    pub llm: Option<Arc<dyn LlmProvider>>,
    /// Cache-aside Spoonacular access
    pub recipe_cache: Arc<RecipeCacheService>,
    /// Community recipes and merged search
    pub recipes: RecipeService,
    /// Ratings and saved recipes
    pub interactions: InteractionService,
    /// Weekly meal plans
    pub meal_plans: MealPlanService,
    /// Grocery lists
    pub grocery: GroceryService,
    /// Fridge analysis and AI search
    pub ai_search: AiSearchService,
    /// Registration, login and preferences
    pub accounts: AccountService,
    /// Admin operations
    pub admin: AdminService,
}

impl ServerResources {
    /// Build every resource from configuration
    ///
    /// Connects the database, restores today's quota usage and creates the
    /// Spoonacular client and LLM provider when they are configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or an HTTP client
    /// cannot be built
    pub async fn from_config(config: ServerConfig) -> AppResult<Self> {
        let database = Database::new(&config.database.url).await?;
        let cache = Cache::new(config.cache.to_cache_config(true)).await?;

        let recipe_api: Option<Arc<dyn RecipeApi>> = if config.spoonacular.is_enabled() {
            Some(Arc::new(SpoonacularClient::new(&config.spoonacular)?))
        } else {
            warn!("SPOONACULAR_API_KEY not set, serving local recipes only");
            None
        };

        let llm: Option<Arc<dyn LlmProvider>> = if config.llm.enabled {
            Some(Arc::new(OpenAiCompatibleProvider::from_config(&config.llm)?))
        } else {
            info!("LLM disabled, fridge analysis requires an ingredient list");
            None
        };

        ServerResourcesBuilder::new()
            .with_config(config)
            .with_database(database)
            .with_cache(cache)
            .with_recipe_api(recipe_api)
            .with_llm(llm)
            .build()
            .await
    }
}

/// Builder for [`ServerResources`], used directly by tests to inject mocks
pub struct ServerResourcesBuilder {
    config: Option<ServerConfig>,
    database: Option<Database>,
    cache: Option<Cache>,
    recipe_api: Option<Arc<dyn RecipeApi>>,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl ServerResourcesBuilder {
    /// Create an empty builder
    #[must_use]
    pub const fn new() -> Self {
        Self {
            config: None,
            database: None,
            cache: None,
            recipe_api: None,
            llm: None,
        }
    }

    /// Set the server configuration
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the database
    #[must_use]
    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// Set the cache
    #[must_use]
    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the external recipe API
    #[must_use]
    pub fn with_recipe_api(mut self, recipe_api: Option<Arc<dyn RecipeApi>>) -> Self {
        self.recipe_api = recipe_api;
        self
    }

    /// Set the LLM provider
    #[must_use]
    pub fn with_llm(mut self, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        self.llm = llm;
        self
    }

    /// Build the `ServerResources`
    ///
    /// # Errors
    ///
    /// Returns an error if the database is missing or quota usage cannot be
    /// restored
    pub async fn build(self) -> AppResult<ServerResources> {
        let config = self.config.unwrap_or_default();
        let database = self
            .database
            .ok_or_else(|| AppError::config("Database is required"))?;
        let cache = match self.cache {
            Some(cache) => cache,
            None => Cache::new(config.cache.to_cache_config(false)).await?,
        };
        let auth_manager = Arc::new(auth_manager_from_config(&config));

        let quota =
            RecipeCacheService::restore_quota(&database, config.spoonacular.daily_quota).await?;
        let recipe_cache = Arc::new(RecipeCacheService::new(
            self.recipe_api,
            cache.clone(),
            database.clone(),
            config.rate_limit.external_requests_per_minute,
            quota,
        ));

        let inbound_limiter = config.rate_limit.enabled.then(|| {
            Arc::new(FixedWindowRateLimiter::new(
                config.rate_limit.requests_per_window,
                Duration::from_secs(config.rate_limit.window_secs),
            ))
        });

        let recipes = RecipeService::new(database.clone(), recipe_cache.clone());
        let ai_search =
            AiSearchService::new(self.llm.clone(), recipe_cache.clone(), recipes.clone());

        Ok(ServerResources {
            auth_middleware: Arc::new(AuthMiddleware::new(
                auth_manager.clone(),
                database.clone(),
            )),
            interactions: InteractionService::new(database.clone()),
            meal_plans: MealPlanService::new(database.clone()),
            grocery: GroceryService::new(database.clone()),
            accounts: AccountService::new(database.clone(), auth_manager.clone()),
            admin: AdminService::new(database.clone(), recipe_cache.clone()),
            config: Arc::new(config),
            database,
            cache,
            auth_manager,
            inbound_limiter,
            llm: self.llm,
            recipe_cache,
            recipes,
            ai_search,
        })
    }

    /// Build the `ServerResources` wrapped in an `Arc`
    ///
    /// # Errors
    ///
    /// Returns an error if [`build`](Self::build) fails
    pub async fn build_arc(self) -> AppResult<Arc<ServerResources>> {
        Ok(Arc::new(self.build().await?))
    }
}

impl Default for ServerResourcesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Use the configured secret, or a random one that invalidates tokens on restart
fn auth_manager_from_config(config: &ServerConfig) -> AuthManager {
    let expiry = config.auth.jwt_expiry_hours;
    if let Some(secret) = config.auth.jwt_secret.as_deref() {
        AuthManager::new(secret.as_bytes(), expiry)
    } else {
        warn!("JWT_SECRET not set, generated an ephemeral signing secret");
        AuthManager::new(&generate_jwt_secret(), expiry)
    }
}
