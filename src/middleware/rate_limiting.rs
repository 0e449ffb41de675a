// ABOUTME: Inbound rate limiting middleware for HTTP requests
// ABOUTME: Applies the fixed-window limiter per client and sets X-RateLimit headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Rate Limiting Middleware with HTTP Headers
//!
//! Every API request is counted against a per-client window. The client is the
//! authenticated user when a valid token is present, otherwise the first
//! `x-forwarded-for` address, otherwise the socket address.

use super::auth::{bearer_token, cookie_value};
use crate::auth::AuthManager;
use crate::constants::auth::AUTH_COOKIE_NAME;
use crate::rate_limiting::RateLimitDecision;
use crate::resources::ServerResources;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, HeaderValue};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

/// HTTP header names for rate limiting
pub mod headers {
    /// Maximum requests allowed in the current window
    pub const X_RATE_LIMIT_LIMIT: &str = "X-RateLimit-Limit";
    /// Remaining requests in the current window
    pub const X_RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";
    /// Unix timestamp when the window resets
    pub const X_RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";
    /// Seconds to wait before retrying
    pub const RETRY_AFTER: &str = "Retry-After";
}

/// Create a `HeaderMap` with rate limit headers
///
/// `Retry-After` is only added for rejected requests.
#[must_use]
pub fn create_rate_limit_headers(decision: &RateLimitDecision) -> HeaderMap {
    let mut map = HeaderMap::new();
    let mut insert = |name: &'static str, value: String| {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            map.insert(name, header_value);
        }
    };

    insert(headers::X_RATE_LIMIT_LIMIT, decision.limit.to_string());
    insert(headers::X_RATE_LIMIT_REMAINING, decision.remaining.to_string());
    insert(
        headers::X_RATE_LIMIT_RESET,
        decision.reset_at.timestamp().to_string(),
    );
    if !decision.allowed {
        insert(headers::RETRY_AFTER, decision.retry_after_secs().to_string());
    }
    map
}

/// Key identifying the client for inbound limiting
#[must_use]
pub fn client_key(
    headers: &HeaderMap,
    auth_manager: &AuthManager,
    socket: Option<SocketAddr>,
) -> String {
    let token = cookie_value(headers, AUTH_COOKIE_NAME).or_else(|| bearer_token(headers));
    if let Some(auth) = token.and_then(|t| auth_manager.authenticate(&t).ok()) {
        return format!("user:{}", auth.user_id);
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return format!("ip:{ip}");
    }

    socket.map_or_else(|| "anonymous".to_owned(), |addr| format!("ip:{}", addr.ip()))
}

/// Reject requests over the inbound limit with 429 and attach limit headers
pub async fn rate_limit_middleware(
    State(resources): State<Arc<ServerResources>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(limiter) = resources.inbound_limiter.as_ref() else {
        return next.run(request).await;
    };

    let socket = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let key = client_key(request.headers(), &resources.auth_manager, socket);
    let decision = limiter.check(&key);
    let limit_headers = create_rate_limit_headers(&decision);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        warn!(client = %key, limit = decision.limit, "Inbound rate limit exceeded");
        decision.to_error().into_response()
    };
    response.headers_mut().extend(limit_headers);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_headers_include_retry_after_only_when_rejected() {
        let mut decision = RateLimitDecision {
            allowed: true,
            limit: 10,
            remaining: 3,
            reset_at: Utc::now() + Duration::seconds(30),
        };
        let map = create_rate_limit_headers(&decision);
        assert_eq!(map[headers::X_RATE_LIMIT_LIMIT], "10");
        assert_eq!(map[headers::X_RATE_LIMIT_REMAINING], "3");
        assert!(map.get(headers::RETRY_AFTER).is_none());

        decision.allowed = false;
        let map = create_rate_limit_headers(&decision);
        assert!(map.get(headers::RETRY_AFTER).is_some());
    }

    #[test]
    fn test_client_key_prefers_forwarded_ip_then_socket() {
        let manager = AuthManager::new(b"secret", 1);
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers, &manager, None), "anonymous");

        let socket: SocketAddr = "10.0.0.7:5555".parse().unwrap();
        assert_eq!(client_key(&headers, &manager, Some(socket)), "ip:10.0.0.7");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        assert_eq!(
            client_key(&headers, &manager, Some(socket)),
            "ip:203.0.113.9"
        );
    }
}
