// ABOUTME: Rate limiting integration tests for API throttling
// ABOUTME: Tests the inbound limiter middleware, its headers and quota restoration
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Rate limiting integration tests

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::Router;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use common::{create_test_database, create_test_resources_with, register_user, test_config};
use http::{header, Request, Response, StatusCode};
use serde_json::Value;
use smartplates_server::middleware::rate_limiting::headers;
use smartplates_server::rate_limiting::{ApiQuotaTracker, FixedWindowRateLimiter};
use smartplates_server::resources::ServerResources;
use smartplates_server::server::build_router;
use smartplates_server::services::RecipeCacheService;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tower::ServiceExt;

async fn limited_router(requests_per_window: u32) -> Result<(Router, Arc<ServerResources>)> {
    let mut config = test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.requests_per_window = requests_per_window;
    config.rate_limit.window_secs = 60;
    let resources = create_test_resources_with(config, None, None).await?;
    Ok((build_router(&resources), resources))
}

async fn get(router: &Router, uri: &str, token: Option<&str>) -> Result<Response<Body>> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(router.clone().oneshot(builder.body(Body::empty())?).await?)
}

#[tokio::test]
async fn test_requests_over_the_limit_get_429() -> Result<()> {
    let (router, _resources) = limited_router(3).await?;

    for expected_remaining in ["2", "1", "0"] {
        let response = get(&router, "/health", None).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[headers::X_RATE_LIMIT_LIMIT], "3");
        assert_eq!(
            response.headers()[headers::X_RATE_LIMIT_REMAINING],
            expected_remaining
        );
        assert!(response.headers().get(headers::RETRY_AFTER).is_none());
    }

    let response = get(&router, "/health", None).await?;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().get(headers::RETRY_AFTER).is_some());

    let body = to_bytes(response.into_body(), usize::MAX).await?;
    let json: Value = serde_json::from_slice(&body)?;
    assert_eq!(json["error"]["code"], "RATE_LIMIT_EXCEEDED");
    Ok(())
}

#[tokio::test]
async fn test_authenticated_users_have_their_own_window() -> Result<()> {
    let (router, resources) = limited_router(1).await?;
    let (_id, token) = register_user(&resources, "limited@example.com").await?;

    assert_eq!(get(&router, "/health", None).await?.status(), StatusCode::OK);
    assert_eq!(
        get(&router, "/health", None).await?.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    // The anonymous window is exhausted but the user's is untouched
    assert_eq!(
        get(&router, "/health", Some(&token)).await?.status(),
        StatusCode::OK
    );
    assert_eq!(
        get(&router, "/health", Some(&token)).await?.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    Ok(())
}

#[tokio::test]
async fn test_forwarded_clients_are_limited_separately() -> Result<()> {
    let (router, _resources) = limited_router(1).await?;

    for ip in ["203.0.113.7", "203.0.113.8"] {
        let request = Request::builder()
            .uri("/health")
            .header("x-forwarded-for", format!("{ip}, 10.0.0.1"))
            .body(Body::empty())?;
        let response = router.clone().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::OK);
    }
    Ok(())
}

#[tokio::test]
async fn test_disabled_limiter_adds_no_headers() -> Result<()> {
    let resources = create_test_resources_with(test_config(), None, None).await?;
    assert!(resources.inbound_limiter.is_none());

    let router = build_router(&resources);
    for _ in 0..5 {
        let response = get(&router, "/health", None).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(headers::X_RATE_LIMIT_LIMIT).is_none());
    }
    Ok(())
}

#[test]
fn test_fixed_window_counts_and_purges() {
    let limiter = FixedWindowRateLimiter::new(2, Duration::from_millis(50));
    let now = Instant::now();

    assert!(limiter.check_at("a", now).allowed);
    assert!(limiter.check_at("a", now).allowed);
    let rejected = limiter.check_at("a", now);
    assert!(!rejected.allowed);
    assert_eq!(rejected.remaining, 0);
    assert_eq!(rejected.to_error().http_status(), 429);

    assert_eq!(limiter.tracked_keys(), 1);
    thread::sleep(Duration::from_millis(60));
    assert_eq!(limiter.purge_expired(), 1);
    assert_eq!(limiter.tracked_keys(), 0);
}

#[test]
fn test_quota_counts_per_utc_day() {
    let tracker = ApiQuotaTracker::new(10);
    let morning = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();

    tracker.try_consume_at(10, morning).unwrap();
    assert!(tracker.check_available_at(1, morning).is_err());

    let next_day = morning + ChronoDuration::days(1);
    let status = tracker.check_available_at(1, next_day).unwrap();
    assert_eq!(status.used, 0);
    assert_eq!(status.remaining, 10);
}

#[tokio::test]
async fn test_quota_resumes_from_persisted_usage() -> Result<()> {
    let database = create_test_database().await?;
    let today = Utc::now().date_naive();
    database.record_api_usage(today, "/recipes/complexSearch", 4).await?;
    database.record_api_usage(today, "/recipes/informationBulk", 3).await?;
    database
        .record_api_usage(today - ChronoDuration::days(1), "/recipes/complexSearch", 50)
        .await?;

    let tracker = RecipeCacheService::restore_quota(&database, 10).await?;
    let status = tracker.status();
    assert_eq!(status.used, 7);
    assert_eq!(status.remaining, 3);
    Ok(())
}
