// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory resources, a stub LLM, user helpers and HTTP request helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `smartplates_server`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::Router;
use http::{header, Method, Request, StatusCode};
use serde_json::Value;
use smartplates_server::{
    cache::factory::Cache,
    config::environment::ServerConfig,
    database::Database,
    errors::AppError,
    external::{MockRecipeApi, RecipeApi},
    llm::{ChatRequest, ChatResponse, LlmProvider},
    models::{Recipe, RecipeInput},
    resources::{ServerResources, ServerResourcesBuilder},
    server::build_router,
    services::accounts::RegisterRequest,
};
use std::env;
use std::sync::{Arc, Mutex, Once, PoisonError};
use tower::ServiceExt;
use tracing::Level;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    Ok(Database::new("sqlite::memory:").await?)
}

/// Test configuration with the inbound limiter off
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::for_testing();
    config.rate_limit.enabled = false;
    config
}

/// LLM stand-in that answers every request with a fixed reply
pub struct StubLlm {
    reply: String,
    requests: Mutex<Vec<ChatRequest>>,
}

impl StubLlm {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn last_request_had_image(&self) -> bool {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .is_some_and(ChatRequest::has_image)
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn default_model(&self) -> &str {
        "stub-vision"
    }

    fn supports_vision(&self) -> bool {
        true
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Ok(ChatResponse {
            content: self.reply.clone(),
            model: "stub-vision".to_owned(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }
}

/// Resources over an in-memory database with optional mock upstreams
pub async fn create_test_resources_with(
    config: ServerConfig,
    api: Option<Arc<MockRecipeApi>>,
    llm: Option<Arc<dyn LlmProvider>>,
) -> Result<Arc<ServerResources>> {
    let database = create_test_database().await?;
    let cache = Cache::new(config.cache.to_cache_config(false)).await?;
    let api: Option<Arc<dyn RecipeApi>> = api.map(|a| a as Arc<dyn RecipeApi>);

    Ok(ServerResourcesBuilder::new()
        .with_config(config)
        .with_database(database)
        .with_cache(cache)
        .with_recipe_api(api)
        .with_llm(llm)
        .build_arc()
        .await?)
}

/// Resources with the default mock recipe API and no LLM
pub async fn create_test_resources() -> Result<(Arc<ServerResources>, Arc<MockRecipeApi>)> {
    let api = Arc::new(MockRecipeApi::new());
    let resources = create_test_resources_with(test_config(), Some(api.clone()), None).await?;
    Ok((resources, api))
}

/// Register a user and return its id and bearer token
pub async fn register_user(resources: &ServerResources, email: &str) -> Result<(Uuid, String)> {
    let session = resources
        .accounts
        .register(RegisterRequest {
            email: email.to_owned(),
            password: "correct-horse".to_owned(),
            display_name: Some("Test Cook".to_owned()),
        })
        .await?;
    Ok((session.user.id, session.token))
}

/// Create an admin and return its id and bearer token
pub async fn create_admin(resources: &ServerResources) -> Result<(Uuid, String)> {
    let admin = resources
        .accounts
        .ensure_admin("admin@smartplates.test", "admin-password", false)
        .await?;
    let issued = resources.auth_manager.generate_token(&admin)?;
    Ok((admin.id, issued.token))
}

/// A valid community recipe body
pub fn recipe_input(title: &str, servings: u32) -> Result<RecipeInput> {
    Ok(serde_json::from_value(serde_json::json!({
        "title": title,
        "summary": "Family favourite",
        "ready_in_minutes": 25,
        "servings": servings,
        "cuisines": ["Italian"],
        "diets": ["vegetarian"],
        "ingredients": [
            { "name": "spaghetti", "amount": 200.0, "unit": "g", "aisle": "Pasta and Rice" },
            { "name": "Garlic", "amount": 2.0, "unit": "cloves", "aisle": "Produce" }
        ],
        "instructions": ["Boil", "Toss"]
    }))?)
}

/// Create a community recipe authored by `user_id`
pub async fn create_recipe(
    resources: &ServerResources,
    token: &str,
    title: &str,
    servings: u32,
) -> Result<Recipe> {
    let auth = resources.auth_manager.authenticate(token)?;
    Ok(resources
        .recipes
        .create(&auth, recipe_input(title, servings)?)
        .await?)
}

/// Full application router, including middleware
pub fn test_router(resources: &Arc<ServerResources>) -> Router {
    build_router(resources)
}

/// Send one request through the router and decode the JSON body (Null when empty)
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, json))
}
