// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Liveness always answers; readiness probes the database and the cache
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Health check routes for service monitoring
//!
//! `/health` is a liveness probe. `/ready` answers 503 until both the
//! database and the cache respond.

use crate::constants::endpoints::{HEALTH_CHECK, READY_CHECK};
use crate::resources::ServerResources;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(HEALTH_CHECK, get(Self::handle_health))
            .route(READY_CHECK, get(Self::handle_ready))
            .with_state(resources)
    }

    async fn handle_health() -> Json<serde_json::Value> {
        Json(json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339()
        }))
    }

    async fn handle_ready(State(resources): State<Arc<ServerResources>>) -> Response {
        let database = resources.database.health_check().await;
        let cache = resources.cache.health_check().await;

        if let Err(e) = &database {
            warn!(error = %e, "Readiness check: database unavailable");
        }
        if let Err(e) = &cache {
            warn!(error = %e, "Readiness check: cache unavailable");
        }

        let ready = database.is_ok() && cache.is_ok();
        let status = if ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        (
            status,
            Json(json!({
                "status": if ready { "ready" } else { "not_ready" },
                "checks": {
                    "database": if database.is_ok() { "ok" } else { "error" },
                    "cache": if cache.is_ok() { "ok" } else { "error" },
                    "recipe_api": if resources.recipe_cache.is_enabled() { "configured" } else { "disabled" },
                    "llm": if resources.llm.is_some() { "configured" } else { "disabled" },
                },
                "timestamp": Utc::now().to_rfc3339()
            })),
        )
            .into_response()
    }
}
