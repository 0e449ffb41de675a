// ABOUTME: Integration tests for grocery list generation and editing
// ABOUTME: Verifies servings scaling, ingredient merging, aisle grouping and item toggling
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use chrono::NaiveDate;
use common::{create_test_resources, register_user};
use smartplates_server::errors::ErrorCode;
use smartplates_server::models::{DayPlan, GroceryItem, GroceryList, MealPlan, MealRef};
use smartplates_server::resources::ServerResources;
use smartplates_server::services::grocery::{GroceryListInput, GroceryListUpdate};
use smartplates_server::services::meal_plans::MealPlanInput;
use uuid::Uuid;

fn item<'a>(list: &'a GroceryList, name: &str) -> &'a GroceryItem {
    list.items
        .iter()
        .find(|i| i.name == name)
        .unwrap_or_else(|| panic!("{name} missing from {:?}", list.items))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Plan pasta for four (recipe serves two) and curry at its own four servings
async fn plan_pasta_and_curry(resources: &ServerResources, user_id: Uuid) -> Result<MealPlan> {
    let pasta = resources.recipe_cache.get_recipe(715_538).await?;
    let curry = resources.recipe_cache.get_recipe(716_429).await?;

    let dinner = |recipe_id: Uuid, servings: u32| DayPlan {
        dinner: Some(MealRef {
            recipe_id,
            title: String::new(),
            servings,
            image_url: None,
        }),
        ..DayPlan::default()
    };
    Ok(resources
        .meal_plans
        .create(
            user_id,
            MealPlanInput {
                week_start: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                days: vec![dinner(pasta.id, 4), dinner(curry.id, 0)],
                notes: None,
            },
        )
        .await?)
}

#[tokio::test]
async fn test_generated_list_scales_and_merges() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, _token) = register_user(&resources, "shopper@example.com").await?;
    let plan = plan_pasta_and_curry(&resources, user_id).await?;

    let list = resources
        .grocery
        .generate_from_meal_plan(user_id, plan.id, None)
        .await?;

    assert_eq!(list.meal_plan_id, Some(plan.id));
    assert_eq!(list.name, "Groceries for week of 2025-06-02");

    // 3 cloves x2 from the pasta plus 2 cloves from the curry
    let garlic = item(&list, "garlic");
    assert!(close(garlic.amount, 8.0));
    assert_eq!(garlic.unit, "clove");
    assert_eq!(garlic.category, "Produce");

    let spaghetti = item(&list, "spaghetti");
    assert!(close(spaghetti.amount, 400.0));
    assert_eq!(spaghetti.unit, "g");
    assert_eq!(spaghetti.category, "Pasta, Rice & Grains");

    assert!(close(item(&list, "chicken breast").amount, 500.0));
    assert!(close(item(&list, "tomato").amount, 4.0));
    assert!(list.items.iter().all(|i| !i.checked));

    // Grouped by aisle, then alphabetical
    let keys: Vec<(&str, &str)> = list
        .items
        .iter()
        .map(|i| (i.category.as_str(), i.name.as_str()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);

    let stored = resources.grocery.get(user_id, list.id).await?;
    assert_eq!(stored.items, list.items);
    Ok(())
}

#[tokio::test]
async fn test_generate_from_unknown_plan_is_not_found() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, _token) = register_user(&resources, "shopper@example.com").await?;

    let err = resources
        .grocery
        .generate_from_meal_plan(user_id, Uuid::new_v4(), Some("Weekly".to_owned()))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    Ok(())
}

#[tokio::test]
async fn test_toggle_and_add_items() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, _token) = register_user(&resources, "shopper@example.com").await?;
    let plan = plan_pasta_and_curry(&resources, user_id).await?;
    let list = resources
        .grocery
        .generate_from_meal_plan(user_id, plan.id, Some("Big shop".to_owned()))
        .await?;
    assert_eq!(list.name, "Big shop");

    // Adding garlic in another spelling of the unit merges into the existing line
    let extra = GroceryItem {
        name: "Garlic".to_owned(),
        amount: 2.0,
        unit: "Cloves".to_owned(),
        category: String::new(),
        checked: false,
    };
    let list = resources.grocery.add_item(user_id, list.id, extra).await?;
    assert!(close(item(&list, "garlic").amount, 10.0));

    let index = list.items.iter().position(|i| i.name == "garlic").unwrap();
    let toggled = resources.grocery.toggle_item(user_id, list.id, index).await?;
    assert!(toggled.items[index].checked);
    let toggled = resources.grocery.toggle_item(user_id, list.id, index).await?;
    assert!(!toggled.items[index].checked);

    let err = resources
        .grocery
        .toggle_item(user_id, list.id, toggled.items.len())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    Ok(())
}

#[tokio::test]
async fn test_manual_list_lifecycle() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, _token) = register_user(&resources, "shopper@example.com").await?;

    let milk = GroceryItem {
        name: " Milk ".to_owned(),
        amount: 1.0,
        unit: "litres".to_owned(),
        category: String::new(),
        checked: false,
    };
    let list = resources
        .grocery
        .create(
            user_id,
            GroceryListInput {
                name: "Corner shop".to_owned(),
                items: vec![milk],
            },
        )
        .await?;
    assert_eq!(list.meal_plan_id, None);
    assert_eq!(list.items[0].name, "Milk");
    assert_eq!(list.items[0].unit, "l");
    assert_eq!(list.items[0].category, "Dairy & Eggs");

    let renamed = resources
        .grocery
        .update(
            user_id,
            list.id,
            GroceryListUpdate {
                name: Some("Corner shop run".to_owned()),
                items: None,
            },
        )
        .await?;
    assert_eq!(renamed.name, "Corner shop run");
    assert_eq!(renamed.items.len(), 1);

    let err = resources
        .grocery
        .update(
            user_id,
            list.id,
            GroceryListUpdate {
                name: Some("  ".to_owned()),
                items: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    // Other users cannot see or delete it
    let (other, _) = register_user(&resources, "other@example.com").await?;
    assert!(resources.grocery.list(other).await?.is_empty());
    let err = resources.grocery.delete(other, list.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    resources.grocery.delete(user_id, list.id).await?;
    assert!(resources.grocery.list(user_id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_deleting_plan_keeps_generated_list() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, _token) = register_user(&resources, "shopper@example.com").await?;
    let plan = plan_pasta_and_curry(&resources, user_id).await?;
    let list = resources
        .grocery
        .generate_from_meal_plan(user_id, plan.id, None)
        .await?;

    resources.meal_plans.delete(user_id, plan.id).await?;

    let kept = resources.grocery.get(user_id, list.id).await?;
    assert_eq!(kept.meal_plan_id, None);
    assert_eq!(kept.items.len(), list.items.len());
    Ok(())
}
