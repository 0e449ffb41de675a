// ABOUTME: Authentication route handlers for registration, login and session lookup
// ABOUTME: Issues JWTs in the body and as an HttpOnly auth_token cookie
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Authentication routes
//!
//! Tokens are returned in the JSON body for API clients and set as the
//! `auth_token` cookie for browsers. Either is accepted on later requests.

use crate::constants::auth::AUTH_COOKIE_NAME;
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::routes::extract::AppJson;
use crate::services::accounts::{AuthResponse, LoginRequest, RegisterRequest};
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::handle_register))
            .route("/api/auth/login", post(Self::handle_login))
            .route("/api/auth/logout", post(Self::handle_logout))
            .route("/api/auth/me", get(Self::handle_me))
            .with_state(resources)
    }

    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        AppJson(request): AppJson<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let session = resources.accounts.register(request).await?;
        Ok(Self::session_response(&resources, StatusCode::CREATED, &session))
    }

    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        AppJson(request): AppJson<LoginRequest>,
    ) -> Result<Response, AppError> {
        let session = resources.accounts.login(request).await?;
        Ok(Self::session_response(&resources, StatusCode::OK, &session))
    }

    async fn handle_logout() -> Response {
        let cookie = format!("{AUTH_COOKIE_NAME}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0");
        let mut response = StatusCode::NO_CONTENT.into_response();
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
        response
    }

    async fn handle_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate(&headers).await?;
        let profile = resources.accounts.profile(auth.user_id).await?;
        Ok((StatusCode::OK, Json(profile)).into_response())
    }

    fn session_response(
        resources: &ServerResources,
        status: StatusCode,
        session: &AuthResponse,
    ) -> Response {
        let max_age = resources.auth_manager.token_expiry_hours() * 3600;
        let secure = if resources.config.environment.is_production() {
            "; Secure"
        } else {
            ""
        };
        let cookie = format!(
            "{AUTH_COOKIE_NAME}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age}{secure}",
            session.token
        );

        let mut response = (status, Json(session)).into_response();
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
        response
    }
}
