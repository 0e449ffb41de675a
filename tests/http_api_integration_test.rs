// ABOUTME: Integration tests for HTTP API endpoints through the full router
// ABOUTME: Tests auth, recipes, meal plans, grocery lists, admin, contact and fridge workflows
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{
    create_admin, create_test_resources, create_test_resources_with, send, test_config,
    test_router, StubLlm,
};
use http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use smartplates_server::external::MockRecipeApi;
use smartplates_server::llm::LlmProvider;
use smartplates_server::server::MAX_REQUEST_BODY_BYTES;
use std::sync::Arc;
use tower::ServiceExt;

async fn register(router: &Router, email: &str) -> Result<(String, String)> {
    let (status, body) = send(
        router,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": "correct-horse", "display_name": "Cook" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Ok((
        body["token"].as_str().unwrap().to_owned(),
        body["user"]["id"].as_str().unwrap().to_owned(),
    ))
}

fn recipe_body(title: &str) -> Value {
    json!({
        "title": title,
        "servings": 2,
        "ingredients": [{ "name": "egg", "amount": 2.0, "unit": "" }],
        "instructions": ["Whisk", "Cook"]
    })
}

#[tokio::test]
async fn test_health_and_readiness() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let router = test_router(&resources);

    let (status, body) = send(&router, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&router, Method::GET, "/ready", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"], "ok");
    assert_eq!(body["checks"]["recipe_api"], "configured");
    assert_eq!(body["checks"]["llm"], "disabled");
    Ok(())
}

#[tokio::test]
async fn test_register_login_and_profile() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let router = test_router(&resources);

    let (token, user_id) = register(&router, "Chef@Example.com").await?;

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": "chef@example.com", "password": "another-pass" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "RESOURCE_ALREADY_EXISTS");

    for bad in [
        json!({ "email": "not-an-email", "password": "correct-horse" }),
        json!({ "email": "short@example.com", "password": "short" }),
    ] {
        let (status, _) =
            send(&router, Method::POST, "/api/auth/register", None, Some(bad)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "chef@example.com", "password": "wrong-password" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "chef@example.com", "password": "correct-horse" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id.as_str());

    let (status, body) = send(&router, Method::GET, "/api/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "chef@example.com");
    assert!(body.get("password_hash").is_none());

    let (status, body) = send(&router, Method::GET, "/api/auth/me", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

    let (status, _) =
        send(&router, Method::GET, "/api/auth/me", Some("not-a-jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_login_sets_http_only_cookie_that_authenticates() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let router = test_router(&resources);
    register(&router, "cookie@example.com").await?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "cookie@example.com", "password": "correct-horse" }).to_string(),
        ))?;
    let response = router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response.headers()[header::SET_COOKIE].to_str()?.to_owned();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Secure"));

    let pair = cookie.split(';').next().unwrap().to_owned();
    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, pair)
        .body(Body::empty())?;
    let response = router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = send(&router, Method::POST, "/api/auth/logout", None, None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn test_recipe_crud_and_ownership() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let router = test_router(&resources);
    let (author, _) = register(&router, "author@example.com").await?;
    let (other, _) = register(&router, "other@example.com").await?;

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/recipes",
        None,
        Some(recipe_body("Omelette")),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, created) = send(
        &router,
        Method::POST,
        "/api/recipes",
        Some(&author),
        Some(recipe_body("Omelette")),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_owned();
    let uri = format!("/api/recipes/{id}");

    let (status, fetched) = send(&router, Method::GET, &uri, None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Omelette");

    let (status, body) = send(
        &router,
        Method::PUT,
        &uri,
        Some(&other),
        Some(recipe_body("Stolen Omelette")),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "PERMISSION_DENIED");

    let (status, updated) = send(
        &router,
        Method::PUT,
        &uri,
        Some(&author),
        Some(recipe_body("Cheese Omelette")),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Cheese Omelette");

    let (status, body) = send(
        &router,
        Method::POST,
        &format!("{uri}/rating"),
        Some(&other),
        Some(json!({ "rating": 4 })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating_count"], 1);

    let (status, body) =
        send(&router, Method::POST, &format!("{uri}/save"), Some(&other), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], true);

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/users/me/saved-recipes",
        Some(&other),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipes"].as_array().unwrap().len(), 1);

    let (status, _) = send(&router, Method::DELETE, &uri, Some(&author), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&router, Method::GET, &uri, None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");

    let (status, body) =
        send(&router, Method::GET, "/api/recipes/not-a-uuid", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_FORMAT");
    Ok(())
}

#[tokio::test]
async fn test_search_and_external_details() -> Result<()> {
    let (resources, api) = create_test_resources().await?;
    let router = test_router(&resources);

    let (status, body) = send(&router, Method::GET, "/api/recipes?q=curry", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["external_id"], 716_429);

    let (status, body) =
        send(&router, Method::GET, "/api/recipes/external/716429", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Chicken Tomato Curry");

    let (status, _) =
        send(&router, Method::GET, "/api/recipes/external/716429", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(api.total_calls(), 2);

    let (status, _) =
        send(&router, Method::GET, "/api/recipes/external/abc", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/recipes/autocomplete?q=garlic",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestions"][0]["external_id"], 715_538);
    Ok(())
}

#[tokio::test]
async fn test_meal_plan_and_grocery_workflow() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let router = test_router(&resources);
    let (token, _) = register(&router, "planner@example.com").await?;

    let (_, recipe) = send(
        &router,
        Method::GET,
        "/api/recipes/external/715538",
        None,
        None,
    )
    .await?;
    let recipe_id = recipe["id"].as_str().unwrap().to_owned();

    let plan_body = json!({
        "week_start": "2025-06-05",
        "days": [{ "dinner": { "recipe_id": recipe_id, "servings": 4 } }]
    });
    let (status, plan) = send(
        &router,
        Method::POST,
        "/api/meal-plans",
        Some(&token),
        Some(plan_body.clone()),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(plan["week_start"], "2025-06-02");
    assert_eq!(plan["days"][0]["dinner"]["title"], "Garlic Butter Pasta");

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/meal-plans",
        Some(&token),
        Some(plan_body),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, fetched) = send(
        &router,
        Method::GET,
        "/api/meal-plans?week=2025-06-08",
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], plan["id"]);

    let plan_id = plan["id"].as_str().unwrap();
    let (status, slot) = send(
        &router,
        Method::PATCH,
        &format!("/api/meal-plans/{plan_id}/slot"),
        Some(&token),
        Some(json!({ "day": 2, "meal_type": "lunch", "meal": { "recipe_id": recipe_id } })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slot["days"][2]["lunch"]["servings"], 2);

    let (status, list) = send(
        &router,
        Method::POST,
        "/api/grocery-lists/generate",
        Some(&token),
        Some(json!({ "meal_plan_id": plan_id })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let garlic = list["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["name"] == "garlic")
        .unwrap();
    // 3 cloves scaled x2 for dinner plus 3 for lunch
    assert_eq!(garlic["amount"], 9.0);

    let list_id = list["id"].as_str().unwrap();
    let (status, toggled) = send(
        &router,
        Method::PATCH,
        &format!("/api/grocery-lists/{list_id}/items/0"),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["items"][0]["checked"], true);

    let (status, lists) =
        send(&router, Method::GET, "/api/grocery-lists", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lists["grocery_lists"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let router = test_router(&resources);
    let (user_token, user_id) = register(&router, "regular@example.com").await?;
    let (_admin_id, admin_token) = create_admin(&resources).await?;

    let (status, _) =
        send(&router, Method::GET, "/api/admin/stats", Some(&user_token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, stats) =
        send(&router, Method::GET, "/api/admin/stats", Some(&admin_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["users"], 2);

    let (status, page) =
        send(&router, Method::GET, "/api/admin/users", Some(&admin_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);

    // Deactivation locks the user out immediately
    let (status, _) = send(
        &router,
        Method::PATCH,
        &format!("/api/admin/users/{user_id}"),
        Some(&admin_token),
        Some(json!({ "is_active": false })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        send(&router, Method::GET, "/api/auth/me", Some(&user_token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "regular@example.com", "password": "correct-horse" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        send(&router, Method::GET, "/api/admin/quota", Some(&admin_token), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &router,
        Method::DELETE,
        "/api/admin/cache?scope=search",
        Some(&admin_token),
        None,
    )
    .await?;
    assert!(status.is_success());
    Ok(())
}

#[tokio::test]
async fn test_categories_and_contact() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let router = test_router(&resources);
    let (user_token, _) = register(&router, "curious@example.com").await?;
    let (_admin_id, admin_token) = create_admin(&resources).await?;

    let category = json!({ "name": "Quick Dinners", "description": "Under 30 minutes" });
    let (status, _) = send(
        &router,
        Method::POST,
        "/api/categories",
        Some(&user_token),
        Some(category.clone()),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = send(
        &router,
        Method::POST,
        "/api/categories",
        Some(&admin_token),
        Some(category.clone()),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "quick-dinners");

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/categories",
        Some(&admin_token),
        Some(category),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&router, Method::GET, "/api/categories", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/contact",
        None,
        Some(json!({
            "name": "Visitor",
            "email": "visitor@example.com",
            "subject": "Hello",
            "message": "Love the meal planner!"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["received"], true);

    let (status, inbox) = send(
        &router,
        Method::GET,
        "/api/admin/contact?unhandled=true",
        Some(&admin_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox["messages"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_fridge_analysis_with_vision_model() -> Result<()> {
    let llm = Arc::new(StubLlm::new(r#"["Tomato", "basil", "tomato"]"#));
    let api = Arc::new(MockRecipeApi::new());
    let resources = create_test_resources_with(
        test_config(),
        Some(api),
        Some(llm.clone() as Arc<dyn LlmProvider>),
    )
    .await?;
    let router = test_router(&resources);
    let (token, _) = register(&router, "fridge@example.com").await?;

    let image = STANDARD.encode(b"not really a jpeg");
    let (status, body) = send(
        &router,
        Method::POST,
        "/api/fridge/analyze",
        Some(&token),
        Some(json!({ "image": image })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["ingredients"], json!(["tomato", "basil"]));
    assert_eq!(body["detected_by_ai"], true);
    assert_eq!(body["recipes"][0]["external_id"], 782_585);
    assert_eq!(llm.request_count(), 1);
    assert!(llm.last_request_had_image());
    Ok(())
}

#[tokio::test]
async fn test_fridge_image_without_model_is_unavailable() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let router = test_router(&resources);
    let (token, _) = register(&router, "fridge@example.com").await?;

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/fridge/analyze",
        Some(&token),
        Some(json!({ "image": "https://example.com/fridge.jpg" })),
    )
    .await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/fridge/analyze",
        Some(&token),
        Some(json!({ "ingredients": ["chicken", "rice"] })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detected_by_ai"], false);
    assert_eq!(body["recipes"][0]["title"], "Chicken Tomato Curry");
    Ok(())
}

async fn send_raw(
    router: &Router,
    method: Method,
    uri: &str,
    token: &str,
    content_type: Option<&str>,
    body: Body,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let response = router.clone().oneshot(builder.body(body)?).await?;
    let status = response.status();
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json",
        "error bodies are always JSON"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn test_malformed_bodies_return_json_errors() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let router = test_router(&resources);
    let (token, _) = register(&router, "malformed@example.com").await?;

    // Well-formed JSON with a value of the wrong shape
    let (status, body) = send(
        &router,
        Method::POST,
        "/api/meal-plans",
        Some(&token),
        Some(json!({ "week_start": "not-a-date" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    // Truncated JSON
    let (status, body) = send_raw(
        &router,
        Method::POST,
        "/api/recipes",
        &token,
        Some("application/json"),
        Body::from(r#"{"title": 5"#),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_FORMAT");

    let (status, body) = send_raw(
        &router,
        Method::POST,
        "/api/recipes",
        &token,
        None,
        Body::from(r#"{"title": "Soup"}"#),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_FORMAT");
    Ok(())
}

#[tokio::test]
async fn test_bad_query_values_return_json_errors() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let router = test_router(&resources);
    let (token, _) = register(&router, "query@example.com").await?;

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/meal-plans?week=garbage",
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_FORMAT");

    // The Monday of the earliest representable date's week does not exist
    let (status, body) = send(
        &router,
        Method::GET,
        "/api/meal-plans?week=-262143-01-01",
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALUE_OUT_OF_RANGE");

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/meal-plans",
        Some(&token),
        Some(json!({ "week_start": "-262143-01-01" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALUE_OUT_OF_RANGE");

    // The server is still serving
    let (status, _) = send(&router, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_oversized_body_is_rejected_with_json_error() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let router = test_router(&resources);
    let (token, _) = register(&router, "large@example.com").await?;

    let image = "A".repeat(MAX_REQUEST_BODY_BYTES);
    let payload = json!({ "image": image }).to_string();
    let (status, body) = send_raw(
        &router,
        Method::POST,
        "/api/fridge/analyze",
        &token,
        Some("application/json"),
        Body::from(payload),
    )
    .await?;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    Ok(())
}
