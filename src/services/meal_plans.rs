// ABOUTME: Weekly meal planning with one plan per user per week
// ABOUTME: Resolves recipe references and keeps title snapshots on each slot
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{week_monday, DayPlan, MealPlan, MealRef, MealType, Recipe};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// Body for creating or replacing a week
#[derive(Debug, Clone, Deserialize)]
pub struct MealPlanInput {
    /// Any date in the week; normalized to its Monday
    pub week_start: NaiveDate,
    /// Up to seven days, Monday first
    #[serde(default)]
    pub days: Vec<DayPlan>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body for setting or clearing one slot
#[derive(Debug, Clone, Deserialize)]
pub struct SlotUpdate {
    /// Day index, 0 is Monday
    pub day: usize,
    /// Which meal of the day
    pub meal_type: MealType,
    /// New meal, `null` clears the slot
    #[serde(default)]
    pub meal: Option<MealRef>,
}

/// Meal plan operations
#[derive(Clone)]
pub struct MealPlanService {
    database: Database,
}

impl MealPlanService {
    /// Create the service
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// Plan for the week containing `date`
    ///
    /// # Errors
    ///
    /// Returns 404 when the user has no plan for that week and 400 when the
    /// week start is not representable
    pub async fn get_week(&self, user_id: Uuid, date: NaiveDate) -> AppResult<MealPlan> {
        self.database
            .get_meal_plan_for_week(user_id, week_monday(date)?)
            .await?
            .ok_or_else(|| AppError::not_found("Meal plan"))
    }

    /// All plans of a user, newest week first
    ///
    /// # Errors
    ///
    /// Returns a database error
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<MealPlan>> {
        self.database.list_meal_plans(user_id).await
    }

    /// Create a plan for a week that has none yet
    ///
    /// # Errors
    ///
    /// Returns 409 when the week already has a plan and 400 for unknown recipes
    pub async fn create(&self, user_id: Uuid, input: MealPlanInput) -> AppResult<MealPlan> {
        let days = self.resolve_days(input.days).await?;
        let plan = MealPlan::new(user_id, input.week_start, days, input.notes)?;
        self.database.create_meal_plan(&plan).await?;
        info!(plan_id = %plan.id, week = %plan.week_start, "Meal plan created");
        Ok(plan)
    }

    /// Create or replace the plan for a week
    ///
    /// # Errors
    ///
    /// Returns 400 for unknown recipes or a database error
    pub async fn upsert_week(&self, user_id: Uuid, input: MealPlanInput) -> AppResult<MealPlan> {
        let days = self.resolve_days(input.days).await?;
        let plan = MealPlan::new(user_id, input.week_start, days, input.notes)?;
        self.database.upsert_meal_plan(&plan).await
    }

    /// Set or clear a single slot
    ///
    /// # Errors
    ///
    /// Returns 404 for an unknown plan, 400 for a bad day index or unknown recipe
    pub async fn update_slot(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        update: SlotUpdate,
    ) -> AppResult<MealPlan> {
        let mut plan = self
            .database
            .get_meal_plan(user_id, plan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Meal plan"))?;

        let meal = match update.meal {
            Some(meal) => {
                let recipes = self.recipes_for([meal.recipe_id]).await?;
                Some(resolve_meal(meal, &recipes)?)
            }
            None => None,
        };
        plan.set_slot(update.day, update.meal_type, meal)?;
        self.database.update_meal_plan(&plan).await?;
        Ok(plan)
    }

    /// Delete a plan
    ///
    /// # Errors
    ///
    /// Returns 404 when the plan does not exist
    pub async fn delete(&self, user_id: Uuid, plan_id: Uuid) -> AppResult<()> {
        if self.database.delete_meal_plan(user_id, plan_id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Meal plan"))
        }
    }

    async fn resolve_days(&self, days: Vec<DayPlan>) -> AppResult<Vec<DayPlan>> {
        let ids = days.iter().flat_map(DayPlan::meals).map(|m| m.recipe_id);
        let recipes = self.recipes_for(ids).await?;

        days.into_iter()
            .map(|day| {
                let resolve = |slot: Option<MealRef>| {
                    slot.map(|meal| resolve_meal(meal, &recipes)).transpose()
                };
                Ok(DayPlan {
                    breakfast: resolve(day.breakfast)?,
                    lunch: resolve(day.lunch)?,
                    dinner: resolve(day.dinner)?,
                    snacks: resolve(day.snacks)?,
                })
            })
            .collect()
    }

    async fn recipes_for(
        &self,
        ids: impl IntoIterator<Item = Uuid>,
    ) -> AppResult<HashMap<Uuid, Recipe>> {
        let mut ids: Vec<Uuid> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        let recipes = self.database.get_recipes_by_ids(&ids).await?;
        Ok(recipes.into_iter().map(|r| (r.id, r)).collect())
    }
}

/// Check the referenced recipe exists and fill in missing snapshot fields
fn resolve_meal(mut meal: MealRef, recipes: &HashMap<Uuid, Recipe>) -> AppResult<MealRef> {
    let recipe = recipes.get(&meal.recipe_id).ok_or_else(|| {
        AppError::invalid_input(format!("Unknown recipe {} in meal plan", meal.recipe_id))
    })?;
    if meal.title.trim().is_empty() {
        meal.title.clone_from(&recipe.title);
    }
    if meal.servings == 0 {
        meal.servings = recipe.servings;
    }
    if meal.image_url.is_none() {
        meal.image_url.clone_from(&recipe.image_url);
    }
    Ok(meal)
}
