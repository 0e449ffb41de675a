// ABOUTME: In-process RecipeApi implementation with canned recipes
// ABOUTME: Counts calls per endpoint so tests can assert cache behavior

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::{ApiResponse, RecipeApi, RecipeSuggestion};
use crate::constants::spoonacular::{
    ENDPOINT_AUTOCOMPLETE, ENDPOINT_COMPLEX_SEARCH, ENDPOINT_FIND_BY_INGREDIENTS,
    ENDPOINT_RANDOM, ENDPOINT_RECIPE_INFORMATION,
};
use crate::errors::{AppError, AppResult};
use crate::models::{
    ExternalRecipe, Ingredient, IngredientMatch, NutritionInfo, RecipeOrigin, RecipeQuery,
    RecipeSummary, SearchPage,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

/// Mock recipe API for tests and offline development (no network calls)
pub struct MockRecipeApi {
    recipes: Vec<ExternalRecipe>,
    calls: DashMap<&'static str, usize>,
    cost_per_call: AtomicU32,
    failure: Mutex<Option<AppError>>,
}

impl MockRecipeApi {
    /// Create a mock seeded with a handful of recipes
    #[must_use]
    pub fn new() -> Self {
        Self::with_recipes(sample_recipes())
    }

    /// Create a mock serving exactly `recipes`
    #[must_use]
    pub fn with_recipes(recipes: Vec<ExternalRecipe>) -> Self {
        Self {
            recipes,
            calls: DashMap::new(),
            cost_per_call: AtomicU32::new(1),
            failure: Mutex::new(None),
        }
    }

    /// Quota points each call reports
    pub fn set_cost_per_call(&self, cost: u32) {
        self.cost_per_call.store(cost, Ordering::Relaxed);
    }

    /// Make every following call fail with `error`, or succeed again with `None`
    pub fn set_failure(&self, error: Option<AppError>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    /// Total calls across all endpoints
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    /// Calls made to one endpoint path constant
    #[must_use]
    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls.get(endpoint).map_or(0, |count| *count)
    }

    fn record(&self, endpoint: &'static str) -> AppResult<u32> {
        *self.calls.entry(endpoint).or_insert(0) += 1;
        if let Some(error) = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Err(AppError::new(error.code, error.message.clone()));
        }
        Ok(self.cost_per_call.load(Ordering::Relaxed))
    }

    fn summary(recipe: &ExternalRecipe) -> RecipeSummary {
        RecipeSummary {
            id: None,
            external_id: Some(recipe.external_id),
            title: recipe.title.clone(),
            image_url: recipe.image_url.clone(),
            ready_in_minutes: recipe.ready_in_minutes,
            servings: Some(recipe.servings),
            average_rating: None,
            origin: RecipeOrigin::Spoonacular,
        }
    }
}

impl Default for MockRecipeApi {
    fn default() -> Self {
        Self::new()
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn contains_ci(haystack: &[String], needle: &str) -> bool {
    haystack.iter().any(|h| h.eq_ignore_ascii_case(needle.trim()))
}

#[async_trait]
impl RecipeApi for MockRecipeApi {
    async fn search_recipes(
        &self,
        query: &RecipeQuery,
    ) -> AppResult<ApiResponse<SearchPage<RecipeSummary>>> {
        let cost = self.record(ENDPOINT_COMPLEX_SEARCH)?;
        let text = query.text_query().map(str::to_lowercase);

        let matching: Vec<&ExternalRecipe> = self
            .recipes
            .iter()
            .filter(|r| {
                text.as_deref()
                    .is_none_or(|t| r.title.to_lowercase().contains(t))
            })
            .filter(|r| {
                query
                    .cuisine
                    .as_deref()
                    .is_none_or(|c| contains_ci(&r.cuisines, c))
            })
            .filter(|r| query.diet.as_deref().is_none_or(|d| contains_ci(&r.diets, d)))
            .filter(|r| {
                query
                    .max_ready_time
                    .is_none_or(|max| r.ready_in_minutes.is_some_and(|m| m <= max))
            })
            .collect();

        let limit = query.effective_limit();
        let results = matching
            .iter()
            .skip(query.offset as usize)
            .take(limit as usize)
            .map(|r| Self::summary(r))
            .collect();

        Ok(ApiResponse::new(
            SearchPage {
                results,
                offset: query.offset,
                limit,
                total_results: count_u32(matching.len()),
            },
            cost,
        ))
    }

    async fn get_recipe(&self, external_id: i64) -> AppResult<ApiResponse<ExternalRecipe>> {
        let cost = self.record(ENDPOINT_RECIPE_INFORMATION)?;
        self.recipes
            .iter()
            .find(|r| r.external_id == external_id)
            .cloned()
            .map(|r| ApiResponse::new(r, cost))
            .ok_or_else(|| AppError::not_found(format!("External recipe {external_id}")))
    }

    async fn find_by_ingredients(
        &self,
        ingredients: &[String],
        number: u32,
    ) -> AppResult<ApiResponse<Vec<IngredientMatch>>> {
        let cost = self.record(ENDPOINT_FIND_BY_INGREDIENTS)?;
        let wanted: Vec<String> = ingredients.iter().map(|i| i.to_lowercase()).collect();

        let matches = self
            .recipes
            .iter()
            .filter_map(|recipe| {
                let (used, missed): (Vec<String>, Vec<String>) = recipe
                    .ingredients
                    .iter()
                    .map(|i| i.name.clone())
                    .partition(|name| {
                        let name = name.to_lowercase();
                        wanted.iter().any(|w| name.contains(w.as_str()))
                    });
                (!used.is_empty()).then(|| IngredientMatch {
                    external_id: recipe.external_id,
                    title: recipe.title.clone(),
                    image_url: recipe.image_url.clone(),
                    used_ingredient_count: count_u32(used.len()),
                    missed_ingredient_count: count_u32(missed.len()),
                    used_ingredients: used,
                    missed_ingredients: missed,
                    likes: 0,
                })
            })
            .take(number as usize)
            .collect();
        Ok(ApiResponse::new(matches, cost))
    }

    async fn random_recipes(
        &self,
        tags: &[String],
        number: u32,
    ) -> AppResult<ApiResponse<Vec<RecipeSummary>>> {
        let cost = self.record(ENDPOINT_RANDOM)?;
        let results = self
            .recipes
            .iter()
            .filter(|r| {
                tags.iter().all(|t| {
                    contains_ci(&r.diets, t)
                        || contains_ci(&r.cuisines, t)
                        || contains_ci(&r.dish_types, t)
                })
            })
            .take(number as usize)
            .map(Self::summary)
            .collect();
        Ok(ApiResponse::new(results, cost))
    }

    async fn autocomplete(
        &self,
        query: &str,
        number: u32,
    ) -> AppResult<ApiResponse<Vec<RecipeSuggestion>>> {
        let cost = self.record(ENDPOINT_AUTOCOMPLETE)?;
        let needle = query.trim().to_lowercase();
        let suggestions = self
            .recipes
            .iter()
            .filter(|r| r.title.to_lowercase().contains(&needle))
            .take(number as usize)
            .map(|r| RecipeSuggestion {
                external_id: r.external_id,
                title: r.title.clone(),
            })
            .collect();
        Ok(ApiResponse::new(suggestions, cost))
    }
}

fn ingredient(name: &str, amount: f64, unit: &str, aisle: &str) -> Ingredient {
    Ingredient {
        name: name.to_owned(),
        amount,
        unit: unit.to_owned(),
        original: None,
        aisle: Some(aisle.to_owned()),
    }
}

/// Canned recipes served by [`MockRecipeApi::new`]
#[must_use]
pub fn sample_recipes() -> Vec<ExternalRecipe> {
    vec![
        ExternalRecipe {
            external_id: 715_538,
            title: "Garlic Butter Pasta".to_owned(),
            summary: Some("Weeknight pasta with garlic and parmesan".to_owned()),
            image_url: Some("https://img.spoonacular.com/recipes/715538-556x370.jpg".to_owned()),
            ready_in_minutes: Some(20),
            servings: 2,
            cuisines: vec!["Italian".to_owned()],
            dish_types: vec!["main course".to_owned()],
            diets: vec!["vegetarian".to_owned()],
            ingredients: vec![
                ingredient("spaghetti", 200.0, "g", "Pasta and Rice"),
                ingredient("garlic", 3.0, "cloves", "Produce"),
                ingredient("butter", 2.0, "tbsp", "Milk, Eggs, Other Dairy"),
                ingredient("parmesan", 30.0, "g", "Cheese"),
            ],
            instructions: vec![
                "Boil the spaghetti".to_owned(),
                "Melt butter with garlic".to_owned(),
                "Toss with parmesan".to_owned(),
            ],
            nutrition: Some(NutritionInfo {
                calories: 610.0,
                protein_g: 19.0,
                fat_g: 22.0,
                carbs_g: 82.0,
            }),
            source_url: None,
        },
        ExternalRecipe {
            external_id: 716_429,
            title: "Chicken Tomato Curry".to_owned(),
            summary: Some("Mild curry with tomatoes and rice".to_owned()),
            image_url: Some("https://img.spoonacular.com/recipes/716429-556x370.jpg".to_owned()),
            ready_in_minutes: Some(45),
            servings: 4,
            cuisines: vec!["Indian".to_owned()],
            dish_types: vec!["main course".to_owned()],
            diets: vec!["gluten free".to_owned()],
            ingredients: vec![
                ingredient("chicken breast", 500.0, "g", "Meat"),
                ingredient("tomato", 4.0, "", "Produce"),
                ingredient("rice", 300.0, "g", "Pasta and Rice"),
                ingredient("garlic", 2.0, "cloves", "Produce"),
            ],
            instructions: vec![
                "Brown the chicken".to_owned(),
                "Simmer with tomatoes".to_owned(),
                "Serve over rice".to_owned(),
            ],
            nutrition: None,
            source_url: None,
        },
        ExternalRecipe {
            external_id: 782_585,
            title: "Tomato Basil Salad".to_owned(),
            summary: None,
            image_url: None,
            ready_in_minutes: Some(10),
            servings: 2,
            cuisines: vec!["Mediterranean".to_owned()],
            dish_types: vec!["salad".to_owned()],
            diets: vec!["vegan".to_owned(), "vegetarian".to_owned()],
            ingredients: vec![
                ingredient("tomato", 3.0, "", "Produce"),
                ingredient("basil", 10.0, "leaves", "Produce"),
                ingredient("olive oil", 1.0, "tbsp", "Oil, Vinegar, Salad Dressing"),
            ],
            instructions: vec!["Slice tomatoes".to_owned(), "Dress and serve".to_owned()],
            nutrition: None,
            source_url: None,
        },
    ]
}
