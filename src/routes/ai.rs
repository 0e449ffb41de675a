// ABOUTME: Route handlers for fridge photo analysis and natural-language recipe search
// ABOUTME: Both endpoints require a JWT since they can spend LLM and Spoonacular quota
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::limits::DEFAULT_PAGE_SIZE;
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::routes::extract::AppJson;
use crate::services::ai_search::FridgeAnalysisRequest;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Body for natural-language search
#[derive(Debug, Deserialize)]
pub struct AiSearchRequest {
    /// Free text such as "quick vegetarian pasta for two"
    pub query: String,
    /// Maximum number of results
    #[serde(default)]
    pub limit: Option<u32>,
}

/// AI routes implementation
pub struct AiRoutes;

impl AiRoutes {
    /// Create all AI routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/fridge/analyze", post(Self::handle_analyze_fridge))
            .route("/api/ai/search", post(Self::handle_ai_search))
            .with_state(resources)
    }

    async fn handle_analyze_fridge(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppJson(request): AppJson<FridgeAnalysisRequest>,
    ) -> Result<Response, AppError> {
        resources.auth_middleware.authenticate(&headers).await?;
        let analysis = resources.ai_search.analyze_fridge(request).await?;
        Ok((StatusCode::OK, Json(analysis)).into_response())
    }

    async fn handle_ai_search(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        AppJson(request): AppJson<AiSearchRequest>,
    ) -> Result<Response, AppError> {
        resources.auth_middleware.authenticate(&headers).await?;
        if request.query.trim().is_empty() {
            return Err(AppError::invalid_input("Search text is required"));
        }
        let result = resources
            .ai_search
            .natural_language_search(&request.query, request.limit.unwrap_or(DEFAULT_PAGE_SIZE))
            .await?;
        Ok((StatusCode::OK, Json(result)).into_response())
    }
}
