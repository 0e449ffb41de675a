// ABOUTME: Integration tests for community recipes, ratings and bookmarks
// ABOUTME: Exercises ownership rules, rating aggregates, saved recipes and cascading deletes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::{create_admin, create_recipe, create_test_resources, recipe_input, register_user};
use smartplates_server::errors::ErrorCode;
use smartplates_server::models::RecipeQuery;
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_fetch_counts_views() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, token) = register_user(&resources, "author@example.com").await?;

    let recipe = create_recipe(&resources, &token, "Lemon Risotto", 2).await?;
    assert_eq!(recipe.author_id(), Some(user_id));
    assert_eq!(recipe.view_count, 0);

    let fetched = resources.recipes.get_by_id(recipe.id).await?;
    assert_eq!(fetched.title, "Lemon Risotto");
    assert_eq!(fetched.view_count, 1);
    assert_eq!(resources.recipes.get_by_id(recipe.id).await?.view_count, 2);

    let err = resources.recipes.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    Ok(())
}

#[tokio::test]
async fn test_blank_title_is_rejected() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (_user_id, token) = register_user(&resources, "author@example.com").await?;
    let auth = resources.auth_manager.authenticate(&token)?;

    let err = resources
        .recipes
        .create(&auth, recipe_input("   ", 2)?)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    Ok(())
}

#[tokio::test]
async fn test_only_author_or_admin_can_modify() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (_author, author_token) = register_user(&resources, "author@example.com").await?;
    let (_other, other_token) = register_user(&resources, "other@example.com").await?;
    let (_admin, admin_token) = create_admin(&resources).await?;

    let recipe = create_recipe(&resources, &author_token, "Shakshuka", 2).await?;
    let other = resources.auth_manager.authenticate(&other_token)?;
    let author = resources.auth_manager.authenticate(&author_token)?;
    let admin = resources.auth_manager.authenticate(&admin_token)?;

    let err = resources
        .recipes
        .update(&other, recipe.id, recipe_input("Hijacked", 2)?)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    let err = resources.recipes.delete(&other, recipe.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let updated = resources
        .recipes
        .update(&author, recipe.id, recipe_input("Green Shakshuka", 3)?)
        .await?;
    assert_eq!(updated.title, "Green Shakshuka");
    assert_eq!(updated.servings, 3);
    assert_eq!(updated.author_id(), recipe.author_id());

    resources.recipes.delete(&admin, recipe.id).await?;
    assert!(resources.database.get_recipe(recipe.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_ratings_replace_previous_vote() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (_author, token) = register_user(&resources, "author@example.com").await?;
    let (first_rater, _) = register_user(&resources, "one@example.com").await?;
    let (second_rater, _) = register_user(&resources, "two@example.com").await?;
    let recipe = create_recipe(&resources, &token, "Ramen", 2).await?;

    resources.interactions.rate(first_rater, recipe.id, 5).await?;
    let summary = resources.interactions.rate(second_rater, recipe.id, 2).await?;
    assert_eq!(summary.rating_count, 2);
    assert!((summary.average_rating - 3.5).abs() < 1e-9);

    // Rating again changes the vote, not the count
    let summary = resources.interactions.rate(first_rater, recipe.id, 4).await?;
    assert_eq!(summary.rating_count, 2);
    assert!((summary.average_rating - 3.0).abs() < 1e-9);
    assert_eq!(summary.your_rating, 4);

    assert_eq!(
        resources.database.get_user_rating(first_rater, recipe.id).await?,
        Some(4)
    );
    Ok(())
}

#[tokio::test]
async fn test_rating_bounds_and_unknown_recipe() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, token) = register_user(&resources, "author@example.com").await?;
    let recipe = create_recipe(&resources, &token, "Pho", 2).await?;

    for rating in [0, 6] {
        let err = resources
            .interactions
            .rate(user_id, recipe.id, rating)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    }

    let err = resources
        .interactions
        .rate(user_id, Uuid::new_v4(), 3)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    Ok(())
}

#[tokio::test]
async fn test_save_is_idempotent_and_unsave_reports_missing() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, token) = register_user(&resources, "saver@example.com").await?;
    let recipe = create_recipe(&resources, &token, "Tacos", 4).await?;

    resources.interactions.save(user_id, recipe.id).await?;
    resources.interactions.save(user_id, recipe.id).await?;

    let saved = resources.interactions.saved_recipes(user_id).await?;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, recipe.id);

    let profile = resources.accounts.profile(user_id).await?;
    assert_eq!(profile.saved_recipe_ids, vec![recipe.id]);
    assert_eq!(profile.created_recipe_ids, vec![recipe.id]);

    resources.interactions.unsave(user_id, recipe.id).await?;
    let err = resources
        .interactions
        .unsave(user_id, recipe.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert!(resources.interactions.saved_recipes(user_id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_popular_orders_by_rating() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, token) = register_user(&resources, "author@example.com").await?;

    let plain = create_recipe(&resources, &token, "Plain Toast", 1).await?;
    let loved = create_recipe(&resources, &token, "Loved Lasagne", 6).await?;
    resources.interactions.rate(user_id, loved.id, 5).await?;
    resources.interactions.rate(user_id, plain.id, 2).await?;

    let popular = resources.recipes.popular(10).await?;
    let titles: Vec<&str> = popular.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Loved Lasagne", "Plain Toast"]);
    assert!(popular[0]
        .average_rating
        .is_some_and(|avg| (avg - 5.0).abs() < 1e-9));
    Ok(())
}

#[tokio::test]
async fn test_local_search_filters_by_text_and_paginates() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (_user_id, token) = register_user(&resources, "author@example.com").await?;
    for title in ["Bean Chili", "Bean Salad", "Fish Pie"] {
        create_recipe(&resources, &token, title, 2).await?;
    }

    let mut query = RecipeQuery::text("bean");
    query.include_external = false;
    query.limit = 1;

    let page = resources.recipes.search(&query).await?;
    assert_eq!(page.total_results, 2);
    assert_eq!(page.results.len(), 1);

    query.offset = 1;
    let second = resources.recipes.search(&query).await?;
    assert_eq!(second.results.len(), 1);
    assert_ne!(second.results[0].title, page.results[0].title);
    Ok(())
}

#[tokio::test]
async fn test_search_text_wildcards_match_literally() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (_user_id, token) = register_user(&resources, "baker@example.com").await?;
    for title in ["1000 Island Dressing", "100% Rye Loaf", "Salt_Baked Fish", "Saltbaked Bread"] {
        create_recipe(&resources, &token, title, 2).await?;
    }

    let mut query = RecipeQuery::text("100%");
    query.include_external = false;
    let page = resources.recipes.search(&query).await?;
    assert_eq!(page.total_results, 1);
    assert_eq!(page.results[0].title, "100% Rye Loaf");

    query.query = Some("salt_b".into());
    let page = resources.recipes.search(&query).await?;
    assert_eq!(page.total_results, 1);
    assert_eq!(page.results[0].title, "Salt_Baked Fish");

    query.query = Some("%".into());
    assert_eq!(resources.recipes.search(&query).await?.total_results, 1);
    Ok(())
}

#[tokio::test]
async fn test_deleting_user_removes_their_recipes() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, token) = register_user(&resources, "leaving@example.com").await?;
    let recipe = create_recipe(&resources, &token, "Farewell Cake", 8).await?;

    assert!(resources.database.delete_user(user_id).await?);
    assert!(resources.database.get_recipe(recipe.id).await?.is_none());
    assert!(resources.recipes.list_by_author(user_id).await?.is_empty());
    Ok(())
}
