// ABOUTME: Recipe models for locally authored and Spoonacular-mirrored recipes
// ABOUTME: Recipe, RecipeSource, ingredients, search queries and summaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserRole;
use crate::constants::limits::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MAX_TITLE_LENGTH};
use crate::errors::{AppError, AppResult};

/// Single ingredient line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    /// Ingredient name ("olive oil")
    pub name: String,
    /// Quantity for the recipe's servings
    #[serde(default)]
    pub amount: f64,
    /// Unit ("tbsp", "g", "" for countable items)
    #[serde(default)]
    pub unit: String,
    /// Original text as written by the author or upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    /// Supermarket aisle reported by Spoonacular
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aisle: Option<String>,
}

/// Per-serving macro nutrients
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NutritionInfo {
    /// Energy in kcal
    pub calories: f64,
    /// Protein in grams
    pub protein_g: f64,
    /// Fat in grams
    pub fat_g: f64,
    /// Carbohydrates in grams
    pub carbs_g: f64,
}

/// Where a recipe came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecipeSource {
    /// Written by a user of this platform
    Local {
        /// Author's user id
        author_id: Uuid,
    },
    /// Mirrored from Spoonacular
    Spoonacular {
        /// Spoonacular recipe id
        external_id: i64,
    },
}

/// Origin label used in search results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecipeOrigin {
    /// Stored locally
    Local,
    /// From Spoonacular
    Spoonacular,
}

/// Stored recipe document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique identifier
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Short description (may contain upstream HTML)
    pub summary: Option<String>,
    /// Image URL
    pub image_url: Option<String>,
    /// Total time in minutes
    pub ready_in_minutes: Option<u32>,
    /// Number of servings the ingredient amounts are for
    pub servings: u32,
    /// Cuisines ("italian")
    pub cuisines: Vec<String>,
    /// Dish types ("main course")
    pub dish_types: Vec<String>,
    /// Diets ("vegan")
    pub diets: Vec<String>,
    /// Ingredients
    pub ingredients: Vec<Ingredient>,
    /// Ordered steps
    pub instructions: Vec<String>,
    /// Nutrition per serving
    pub nutrition: Option<NutritionInfo>,
    /// Authorship or upstream id
    pub source: RecipeSource,
    /// Mean of all ratings, 0 when unrated
    pub average_rating: f64,
    /// Number of ratings
    pub rating_count: u32,
    /// Number of detail views
    pub view_count: u64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Author of a locally written recipe
    #[must_use]
    pub const fn author_id(&self) -> Option<Uuid> {
        match self.source {
            RecipeSource::Local { author_id } => Some(author_id),
            RecipeSource::Spoonacular { .. } => None,
        }
    }

    /// Spoonacular id of a mirrored recipe
    #[must_use]
    pub const fn external_id(&self) -> Option<i64> {
        match self.source {
            RecipeSource::Spoonacular { external_id } => Some(external_id),
            RecipeSource::Local { .. } => None,
        }
    }

    /// Only the author or an admin may change a recipe
    #[must_use]
    pub fn can_modify(&self, user_id: Uuid, role: UserRole) -> bool {
        role.is_admin() || self.author_id() == Some(user_id)
    }
}

/// Request body for creating or updating a local recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeInput {
    /// Title
    pub title: String,
    /// Summary
    #[serde(default)]
    pub summary: Option<String>,
    /// Image URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Total time in minutes
    #[serde(default)]
    pub ready_in_minutes: Option<u32>,
    /// Servings
    #[serde(default = "default_recipe_servings")]
    pub servings: u32,
    /// Cuisines
    #[serde(default)]
    pub cuisines: Vec<String>,
    /// Dish types
    #[serde(default)]
    pub dish_types: Vec<String>,
    /// Diets
    #[serde(default)]
    pub diets: Vec<String>,
    /// Ingredients
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    /// Steps
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Nutrition per serving
    #[serde(default)]
    pub nutrition: Option<NutritionInfo>,
}

const fn default_recipe_servings() -> u32 {
    1
}

impl RecipeInput {
    /// Validate user supplied fields
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty or overlong title, zero servings,
    /// or ingredients without a name
    pub fn validate(&self) -> AppResult<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::invalid_input("Recipe title is required"));
        }
        if title.len() > MAX_TITLE_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Recipe title must be at most {MAX_TITLE_LENGTH} characters"
            )));
        }
        if self.servings == 0 {
            return Err(AppError::invalid_input("Servings must be at least 1"));
        }
        if self.ingredients.iter().any(|i| i.name.trim().is_empty()) {
            return Err(AppError::invalid_input("Every ingredient needs a name"));
        }
        Ok(())
    }

    /// Build a new local recipe authored by `author_id`
    #[must_use]
    pub fn into_recipe(self, author_id: Uuid) -> Recipe {
        let now = Utc::now();
        Recipe {
            id: Uuid::new_v4(),
            title: self.title.trim().to_owned(),
            summary: self.summary,
            image_url: self.image_url,
            ready_in_minutes: self.ready_in_minutes,
            servings: self.servings,
            cuisines: self.cuisines,
            dish_types: self.dish_types,
            diets: self.diets,
            ingredients: self.ingredients,
            instructions: self.instructions,
            nutrition: self.nutrition,
            source: RecipeSource::Local { author_id },
            average_rating: 0.0,
            rating_count: 0,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the editable fields of an existing recipe
    pub fn apply_to(self, recipe: &mut Recipe) {
        recipe.title = self.title.trim().to_owned();
        recipe.summary = self.summary;
        recipe.image_url = self.image_url;
        recipe.ready_in_minutes = self.ready_in_minutes;
        recipe.servings = self.servings;
        recipe.cuisines = self.cuisines;
        recipe.dish_types = self.dish_types;
        recipe.diets = self.diets;
        recipe.ingredients = self.ingredients;
        recipe.instructions = self.instructions;
        recipe.nutrition = self.nutrition;
        recipe.updated_at = Utc::now();
    }
}

/// Full recipe as returned by Spoonacular, before mirroring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalRecipe {
    /// Spoonacular id
    pub external_id: i64,
    /// Title
    pub title: String,
    /// Summary
    pub summary: Option<String>,
    /// Image URL
    pub image_url: Option<String>,
    /// Total time in minutes
    pub ready_in_minutes: Option<u32>,
    /// Servings
    pub servings: u32,
    /// Cuisines
    pub cuisines: Vec<String>,
    /// Dish types
    pub dish_types: Vec<String>,
    /// Diets
    pub diets: Vec<String>,
    /// Ingredients
    pub ingredients: Vec<Ingredient>,
    /// Steps
    pub instructions: Vec<String>,
    /// Nutrition per serving
    pub nutrition: Option<NutritionInfo>,
    /// Original publisher URL
    pub source_url: Option<String>,
}

impl ExternalRecipe {
    /// Convert into a mirrored recipe document with a fresh id
    #[must_use]
    pub fn into_recipe(self) -> Recipe {
        let now = Utc::now();
        Recipe {
            id: Uuid::new_v4(),
            title: self.title,
            summary: self.summary,
            image_url: self.image_url,
            ready_in_minutes: self.ready_in_minutes,
            servings: self.servings.max(1),
            cuisines: self.cuisines,
            dish_types: self.dish_types,
            diets: self.diets,
            ingredients: self.ingredients,
            instructions: self.instructions,
            nutrition: self.nutrition,
            source: RecipeSource::Spoonacular {
                external_id: self.external_id,
            },
            average_rating: 0.0,
            rating_count: 0,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Compact recipe entry used in search listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeSummary {
    /// Local id (set for local and mirrored recipes)
    pub id: Option<Uuid>,
    /// Spoonacular id (set for upstream and mirrored recipes)
    pub external_id: Option<i64>,
    /// Title
    pub title: String,
    /// Image URL
    pub image_url: Option<String>,
    /// Total time in minutes
    pub ready_in_minutes: Option<u32>,
    /// Servings
    pub servings: Option<u32>,
    /// Mean rating for local recipes
    pub average_rating: Option<f64>,
    /// Where the entry came from
    pub origin: RecipeOrigin,
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: Some(recipe.id),
            external_id: recipe.external_id(),
            title: recipe.title.clone(),
            image_url: recipe.image_url.clone(),
            ready_in_minutes: recipe.ready_in_minutes,
            servings: Some(recipe.servings),
            average_rating: (recipe.rating_count > 0).then_some(recipe.average_rating),
            origin: RecipeOrigin::Local,
        }
    }
}

/// Recipe suggested from a set of available ingredients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngredientMatch {
    /// Spoonacular id
    pub external_id: i64,
    /// Title
    pub title: String,
    /// Image URL
    pub image_url: Option<String>,
    /// How many of the given ingredients the recipe uses
    pub used_ingredient_count: u32,
    /// How many extra ingredients are needed
    pub missed_ingredient_count: u32,
    /// Names of the used ingredients
    pub used_ingredients: Vec<String>,
    /// Names of the missing ingredients
    pub missed_ingredients: Vec<String>,
    /// Upstream popularity
    pub likes: u32,
}

const fn default_include_external() -> bool {
    true
}

const fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Recipe search parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeQuery {
    /// Free text
    #[serde(default, alias = "q")]
    pub query: Option<String>,
    /// Cuisine filter
    #[serde(default)]
    pub cuisine: Option<String>,
    /// Diet filter
    #[serde(default)]
    pub diet: Option<String>,
    /// Comma separated intolerances
    #[serde(default)]
    pub intolerances: Option<String>,
    /// Dish type filter
    #[serde(default, rename = "type")]
    pub dish_type: Option<String>,
    /// Maximum total time in minutes
    #[serde(default)]
    pub max_ready_time: Option<u32>,
    /// Page offset
    #[serde(default)]
    pub offset: u32,
    /// Page size
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Whether to also query Spoonacular
    #[serde(default = "default_include_external")]
    pub include_external: bool,
}

impl RecipeQuery {
    /// Plain text query with default paging
    #[must_use]
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            limit: DEFAULT_PAGE_SIZE,
            include_external: true,
            ..Self::default()
        }
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Trimmed free text, `None` when blank
    #[must_use]
    pub fn text_query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchPage<T> {
    /// Entries on this page
    pub results: Vec<T>,
    /// Offset of the first entry
    pub offset: u32,
    /// Page size requested
    pub limit: u32,
    /// Total matches reported by the source
    pub total_results: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> RecipeInput {
        RecipeInput {
            title: title.into(),
            summary: None,
            image_url: None,
            ready_in_minutes: Some(20),
            servings: 2,
            cuisines: vec![],
            dish_types: vec![],
            diets: vec![],
            ingredients: vec![],
            instructions: vec!["Boil".into()],
            nutrition: None,
        }
    }

    #[test]
    fn test_author_can_modify_others_cannot() {
        let author = Uuid::new_v4();
        let recipe = input("Soup").into_recipe(author);

        assert!(recipe.can_modify(author, UserRole::User));
        assert!(!recipe.can_modify(Uuid::new_v4(), UserRole::User));
        assert!(recipe.can_modify(Uuid::new_v4(), UserRole::Admin));
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        assert!(input("   ").validate().is_err());
        assert!(input("Pasta").validate().is_ok());
    }

    #[test]
    fn test_query_deserializes_q_alias() {
        let query: RecipeQuery = serde_json::from_str(r#"{"q":"pasta"}"#).unwrap();
        assert_eq!(query.text_query(), Some("pasta"));
        assert_eq!(query.limit, DEFAULT_PAGE_SIZE);
        assert!(query.include_external);
    }
}
