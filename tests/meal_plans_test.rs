// ABOUTME: Integration tests for weekly meal plans
// ABOUTME: Covers week normalization, one-plan-per-week, slot updates and recipe resolution
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use chrono::NaiveDate;
use common::{create_recipe, create_test_resources, register_user};
use smartplates_server::errors::ErrorCode;
use smartplates_server::models::{DayPlan, MealRef, MealType};
use smartplates_server::services::meal_plans::{MealPlanInput, SlotUpdate};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn meal(recipe_id: Uuid, servings: u32) -> MealRef {
    MealRef {
        recipe_id,
        title: String::new(),
        servings,
        image_url: None,
    }
}

fn week_input(week_start: NaiveDate, days: Vec<DayPlan>) -> MealPlanInput {
    MealPlanInput {
        week_start,
        days,
        notes: None,
    }
}

#[tokio::test]
async fn test_plan_is_stored_under_its_monday() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, token) = register_user(&resources, "planner@example.com").await?;
    let recipe = create_recipe(&resources, &token, "Overnight Oats", 1).await?;

    let days = vec![DayPlan {
        breakfast: Some(meal(recipe.id, 0)),
        ..DayPlan::default()
    }];
    // Wednesday 2025-06-04 belongs to the week starting Monday 2025-06-02
    let plan = resources
        .meal_plans
        .create(user_id, week_input(date(2025, 6, 4), days))
        .await?;

    assert_eq!(plan.week_start, date(2025, 6, 2));
    assert_eq!(plan.days.len(), 7);

    let breakfast = plan.days[0].breakfast.as_ref().unwrap();
    assert_eq!(breakfast.title, "Overnight Oats");
    assert_eq!(breakfast.servings, 1);

    // Any day of the week finds the same plan
    let sunday = resources.meal_plans.get_week(user_id, date(2025, 6, 8)).await?;
    assert_eq!(sunday.id, plan.id);
    Ok(())
}

#[tokio::test]
async fn test_second_plan_for_same_week_conflicts() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, _token) = register_user(&resources, "planner@example.com").await?;

    resources
        .meal_plans
        .create(user_id, week_input(date(2025, 6, 2), Vec::new()))
        .await?;
    let err = resources
        .meal_plans
        .create(user_id, week_input(date(2025, 6, 6), Vec::new()))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);

    // A different user may plan the same week
    let (other_id, _) = register_user(&resources, "other@example.com").await?;
    resources
        .meal_plans
        .create(other_id, week_input(date(2025, 6, 2), Vec::new()))
        .await?;
    assert_eq!(resources.meal_plans.list(user_id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_upsert_replaces_existing_week() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, token) = register_user(&resources, "planner@example.com").await?;
    let recipe = create_recipe(&resources, &token, "Lentil Soup", 4).await?;

    let first = resources
        .meal_plans
        .upsert_week(user_id, week_input(date(2025, 6, 2), Vec::new()))
        .await?;

    let days = vec![
        DayPlan::default(),
        DayPlan {
            dinner: Some(meal(recipe.id, 2)),
            ..DayPlan::default()
        },
    ];
    let second = resources
        .meal_plans
        .upsert_week(user_id, week_input(date(2025, 6, 3), days))
        .await?;

    assert_eq!(second.id, first.id);
    assert_eq!(second.days[1].dinner.as_ref().unwrap().servings, 2);
    assert_eq!(resources.meal_plans.list(user_id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_recipe_and_too_many_days_are_rejected() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, _token) = register_user(&resources, "planner@example.com").await?;

    let days = vec![DayPlan {
        lunch: Some(meal(Uuid::new_v4(), 1)),
        ..DayPlan::default()
    }];
    let err = resources
        .meal_plans
        .create(user_id, week_input(date(2025, 6, 2), days))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = resources
        .meal_plans
        .create(user_id, week_input(date(2025, 6, 2), vec![DayPlan::default(); 8]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    Ok(())
}

#[tokio::test]
async fn test_slot_update_sets_and_clears() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (user_id, token) = register_user(&resources, "planner@example.com").await?;
    let recipe = create_recipe(&resources, &token, "Trail Mix", 1).await?;
    let plan = resources
        .meal_plans
        .create(user_id, week_input(date(2025, 6, 2), Vec::new()))
        .await?;

    let updated = resources
        .meal_plans
        .update_slot(
            user_id,
            plan.id,
            SlotUpdate {
                day: 6,
                meal_type: "snack".parse::<MealType>()?,
                meal: Some(meal(recipe.id, 0)),
            },
        )
        .await?;
    assert_eq!(updated.days[6].snacks.as_ref().unwrap().title, "Trail Mix");

    let stored = resources.meal_plans.get_week(user_id, date(2025, 6, 2)).await?;
    assert!(stored.days[6].snacks.is_some());

    let cleared = resources
        .meal_plans
        .update_slot(
            user_id,
            plan.id,
            SlotUpdate {
                day: 6,
                meal_type: MealType::Snacks,
                meal: None,
            },
        )
        .await?;
    assert!(cleared.days[6].snacks.is_none());

    let err = resources
        .meal_plans
        .update_slot(
            user_id,
            plan.id,
            SlotUpdate {
                day: 7,
                meal_type: MealType::Dinner,
                meal: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    Ok(())
}

#[tokio::test]
async fn test_plans_are_private_to_their_owner() -> Result<()> {
    let (resources, _api) = create_test_resources().await?;
    let (owner, _) = register_user(&resources, "owner@example.com").await?;
    let (intruder, _) = register_user(&resources, "intruder@example.com").await?;
    let plan = resources
        .meal_plans
        .create(owner, week_input(date(2025, 6, 2), Vec::new()))
        .await?;

    let err = resources.meal_plans.delete(intruder, plan.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    let err = resources
        .meal_plans
        .get_week(intruder, date(2025, 6, 2))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    resources.meal_plans.delete(owner, plan.id).await?;
    assert!(resources.meal_plans.list(owner).await?.is_empty());
    Ok(())
}
