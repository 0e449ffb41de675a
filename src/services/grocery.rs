// ABOUTME: Grocery list generation from meal plans and saved list management
// ABOUTME: Scales ingredients by planned servings, merges duplicates and groups by aisle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Grocery Lists
//!
//! Generation walks every meal of a plan, scales each ingredient by
//! `planned servings / recipe servings`, and merges lines that share a
//! normalized name and unit. Units are reduced to short abbreviations first,
//! so "2 tablespoons" and "1 tbsp" of the same ingredient end up on one line.

use crate::database::Database;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{GroceryItem, GroceryList, Ingredient, MealPlan, Recipe};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Fallback aisle for items no rule recognizes
pub const DEFAULT_CATEGORY: &str = "Other";

/// Aisle names reported upstream, matched by keyword
const AISLE_RULES: &[(&str, &[&str])] = &[
    ("Produce", &["produce"]),
    ("Meat & Seafood", &["meat", "seafood"]),
    ("Dairy & Eggs", &["milk", "egg", "cheese", "dairy"]),
    ("Bakery", &["bakery", "bread"]),
    ("Pasta, Rice & Grains", &["pasta", "rice", "grain", "cereal"]),
    ("Spices & Seasonings", &["spice", "seasoning"]),
    ("Oils & Condiments", &["oil", "vinegar", "condiment", "salad dressing"]),
    ("Canned Goods", &["canned", "jarred"]),
    ("Baking", &["baking"]),
    ("Frozen", &["frozen"]),
    ("Beverages", &["beverage", "drink", "coffee", "tea"]),
    ("Nuts & Snacks", &["nut", "snack", "dried fruit"]),
];

/// Ingredient names, matched by keyword when no aisle is known
const INGREDIENT_RULES: &[(&str, &[&str])] = &[
    (
        "Meat & Seafood",
        &[
            "chicken", "beef", "pork", "lamb", "turkey", "bacon", "sausage", "ham", "salmon",
            "tuna", "shrimp", "fish", "prawn",
        ],
    ),
    (
        "Dairy & Eggs",
        &[
            "milk", "butter", "cheese", "parmesan", "mozzarella", "yogurt", "yoghurt", "cream",
            "egg",
        ],
    ),
    (
        "Pasta, Rice & Grains",
        &[
            "spaghetti", "pasta", "penne", "noodle", "rice", "quinoa", "oat", "couscous",
        ],
    ),
    ("Bakery", &["bread", "baguette", "tortilla", "bun", "pita"]),
    (
        "Baking",
        &["flour", "sugar", "baking powder", "baking soda", "yeast", "vanilla", "cocoa"],
    ),
    (
        "Spices & Seasonings",
        &[
            "salt", "pepper", "cumin", "paprika", "oregano", "cinnamon", "chili powder",
            "turmeric", "curry powder",
        ],
    ),
    (
        "Oils & Condiments",
        &["oil", "vinegar", "soy sauce", "mustard", "ketchup", "mayonnaise", "honey"],
    ),
    ("Canned Goods", &["canned", "beans", "chickpea", "tomato paste", "broth", "stock"]),
    (
        "Produce",
        &[
            "tomato", "onion", "garlic", "basil", "parsley", "cilantro", "lettuce", "spinach",
            "carrot", "potato", "pepper", "lemon", "lime", "apple", "banana", "mushroom",
            "zucchini", "cucumber", "avocado", "ginger", "celery", "broccoli", "eggplant",
        ],
    ),
];

/// Body for creating a list by hand
#[derive(Debug, Clone, Deserialize)]
pub struct GroceryListInput {
    /// List name
    pub name: String,
    /// Initial items
    #[serde(default)]
    pub items: Vec<GroceryItem>,
}

/// Body for renaming a list or replacing its items
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroceryListUpdate {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New items
    #[serde(default)]
    pub items: Option<Vec<GroceryItem>>,
}

/// Grocery list operations
#[derive(Clone)]
pub struct GroceryService {
    database: Database,
}

impl GroceryService {
    /// Create the service
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// Build and save a list covering every meal of a plan
    ///
    /// # Errors
    ///
    /// Returns 404 for an unknown plan or a database error
    pub async fn generate_from_meal_plan(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        name: Option<String>,
    ) -> AppResult<GroceryList> {
        let plan = self
            .database
            .get_meal_plan(user_id, plan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Meal plan"))?;

        let mut ids: Vec<Uuid> = plan.meals().map(|m| m.recipe_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let recipes: HashMap<Uuid, Recipe> = self
            .database
            .get_recipes_by_ids(&ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let items = aggregate_plan_ingredients(&plan, &recipes);
        let name = name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Groceries for week of {}", plan.week_start));

        let list = GroceryList::new(user_id, name, Some(plan.id), items);
        self.database.create_grocery_list(&list).await?;
        info!(
            list_id = %list.id,
            plan_id = %plan.id,
            items = list.items.len(),
            "Grocery list generated from meal plan"
        );
        Ok(list)
    }

    /// Save a hand-written list
    ///
    /// # Errors
    ///
    /// Returns 400 for a blank name or unnamed items
    pub async fn create(&self, user_id: Uuid, input: GroceryListInput) -> AppResult<GroceryList> {
        let name = validate_name(&input.name)?;
        let items = input
            .items
            .into_iter()
            .map(prepare_item)
            .collect::<AppResult<Vec<_>>>()?;
        let list = GroceryList::new(user_id, name, None, items);
        self.database.create_grocery_list(&list).await?;
        Ok(list)
    }

    /// All lists of a user, recently updated first
    ///
    /// # Errors
    ///
    /// Returns a database error
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<GroceryList>> {
        self.database.list_grocery_lists(user_id).await
    }

    /// One list
    ///
    /// # Errors
    ///
    /// Returns 404 when the list does not exist
    pub async fn get(&self, user_id: Uuid, list_id: Uuid) -> AppResult<GroceryList> {
        self.database
            .get_grocery_list(user_id, list_id)
            .await?
            .ok_or_else(|| AppError::not_found("Grocery list"))
    }

    /// Rename a list and/or replace its items
    ///
    /// # Errors
    ///
    /// Returns 404 when missing, 400 for a blank name or unnamed items
    pub async fn update(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        update: GroceryListUpdate,
    ) -> AppResult<GroceryList> {
        let mut list = self.get(user_id, list_id).await?;
        if let Some(name) = update.name {
            list.name = validate_name(&name)?;
        }
        if let Some(items) = update.items {
            list.items = items
                .into_iter()
                .map(prepare_item)
                .collect::<AppResult<Vec<_>>>()?;
        }
        self.save(list).await
    }

    /// Delete a list
    ///
    /// # Errors
    ///
    /// Returns 404 when the list does not exist
    pub async fn delete(&self, user_id: Uuid, list_id: Uuid) -> AppResult<()> {
        if self.database.delete_grocery_list(user_id, list_id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Grocery list"))
        }
    }

    /// Flip the checked state of one item
    ///
    /// # Errors
    ///
    /// Returns 404 for an unknown list and 400 for an index past the end
    pub async fn toggle_item(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        index: usize,
    ) -> AppResult<GroceryList> {
        let mut list = self.get(user_id, list_id).await?;
        let item_count = list.items.len();
        let item = list.items.get_mut(index).ok_or_else(|| {
            AppError::new(
                ErrorCode::ValueOutOfRange,
                format!("Item index {index} is outside 0..{item_count}"),
            )
        })?;
        item.checked = !item.checked;
        debug!(list_id = %list_id, index, checked = item.checked, "Toggled grocery item");
        self.save(list).await
    }

    /// Append an item, merging with an unchecked line of the same name and unit
    ///
    /// # Errors
    ///
    /// Returns 404 for an unknown list and 400 for an unnamed item
    pub async fn add_item(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        item: GroceryItem,
    ) -> AppResult<GroceryList> {
        let mut list = self.get(user_id, list_id).await?;
        let item = prepare_item(item)?;

        let existing = list.items.iter_mut().find(|i| {
            !i.checked
                && normalize_name(&i.name) == normalize_name(&item.name)
                && normalize_unit(&i.unit) == item.unit
        });
        match existing {
            Some(line) => line.amount = round_amount(line.amount + item.amount),
            None => list.items.push(item),
        }
        self.save(list).await
    }

    async fn save(&self, mut list: GroceryList) -> AppResult<GroceryList> {
        list.updated_at = Utc::now();
        self.database.update_grocery_list(&list).await?;
        Ok(list)
    }
}

/// Scale, merge and sort the ingredients of every planned meal
#[must_use]
pub fn aggregate_plan_ingredients(
    plan: &MealPlan,
    recipes: &HashMap<Uuid, Recipe>,
) -> Vec<GroceryItem> {
    let mut merged: HashMap<(String, String), GroceryItem> = HashMap::new();

    for meal in plan.meals() {
        let Some(recipe) = recipes.get(&meal.recipe_id) else {
            debug!(recipe_id = %meal.recipe_id, "Planned recipe no longer exists, skipping");
            continue;
        };
        let factor = servings_factor(meal.servings, recipe.servings);
        for ingredient in &recipe.ingredients {
            add_ingredient(&mut merged, ingredient, factor);
        }
    }

    let mut items: Vec<GroceryItem> = merged
        .into_values()
        .map(|mut item| {
            item.amount = round_amount(item.amount);
            item
        })
        .collect();
    items.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.unit.cmp(&b.unit))
    });
    items
}

fn add_ingredient(
    merged: &mut HashMap<(String, String), GroceryItem>,
    ingredient: &Ingredient,
    factor: f64,
) {
    let name = normalize_name(&ingredient.name);
    if name.is_empty() {
        return;
    }
    let unit = normalize_unit(&ingredient.unit);
    let amount = ingredient.amount * factor;

    merged
        .entry((name.clone(), unit.clone()))
        .and_modify(|item| item.amount += amount)
        .or_insert_with(|| GroceryItem {
            category: categorize(ingredient.aisle.as_deref(), &name),
            name,
            amount,
            unit,
            checked: false,
        });
}

/// Planned servings over recipe servings; 0 planned servings means unscaled
#[must_use]
pub fn servings_factor(planned: u32, recipe_servings: u32) -> f64 {
    if planned == 0 {
        return 1.0;
    }
    f64::from(planned) / f64::from(recipe_servings.max(1))
}

/// Lower-case and collapse whitespace
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Reduce unit spellings to one abbreviation; countable units become empty
#[must_use]
pub fn normalize_unit(unit: &str) -> String {
    let unit = unit.trim().trim_end_matches('.').to_lowercase();
    let abbreviation = match unit.as_str() {
        "tablespoon" | "tablespoons" | "tbsp" | "tbsps" | "tbs" | "tb" => "tbsp",
        "teaspoon" | "teaspoons" | "tsp" | "tsps" => "tsp",
        "cup" | "cups" | "c" => "cup",
        "gram" | "grams" | "g" | "gr" => "g",
        "kilogram" | "kilograms" | "kg" | "kgs" => "kg",
        "ounce" | "ounces" | "oz" => "oz",
        "pound" | "pounds" | "lb" | "lbs" => "lb",
        "milliliter" | "milliliters" | "millilitre" | "millilitres" | "ml" => "ml",
        "liter" | "liters" | "litre" | "litres" | "l" => "l",
        "clove" | "cloves" => "clove",
        "slice" | "slices" => "slice",
        "can" | "cans" => "can",
        "pinch" | "pinches" => "pinch",
        "" | "piece" | "pieces" | "pc" | "pcs" | "serving" | "servings" | "large" | "medium"
        | "small" | "whole" => "",
        other => return other.to_owned(),
    };
    abbreviation.to_owned()
}

/// Aisle for an ingredient, from the upstream aisle first, then its name
#[must_use]
pub fn categorize(aisle: Option<&str>, name: &str) -> String {
    if let Some(aisle) = aisle.map(str::trim).filter(|a| !a.is_empty()) {
        let lowered = aisle.to_lowercase();
        return match_rules(AISLE_RULES, &lowered).map_or_else(|| aisle.to_owned(), str::to_owned);
    }
    match_rules(INGREDIENT_RULES, &name.to_lowercase())
        .unwrap_or(DEFAULT_CATEGORY)
        .to_owned()
}

fn match_rules(rules: &[(&'static str, &[&str])], text: &str) -> Option<&'static str> {
    rules
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| keyword_matches(text, k)))
        .map(|(category, _)| *category)
}

/// Whole-word match allowing a plural suffix; multi-word keywords match as substrings
fn keyword_matches(text: &str, keyword: &str) -> bool {
    if keyword.contains(' ') {
        return text.contains(keyword);
    }
    text.split(|c: char| !c.is_alphanumeric()).any(|word| {
        word == keyword
            || word.strip_suffix('s') == Some(keyword)
            || word.strip_suffix("es") == Some(keyword)
    })
}

fn round_amount(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::invalid_input("Grocery list name is required"));
    }
    Ok(name.to_owned())
}

fn prepare_item(mut item: GroceryItem) -> AppResult<GroceryItem> {
    if item.name.trim().is_empty() {
        return Err(AppError::invalid_input("Every grocery item needs a name"));
    }
    if !item.amount.is_finite() || item.amount < 0.0 {
        return Err(AppError::invalid_input("Item amount must be zero or positive"));
    }
    item.name = item.name.trim().to_owned();
    item.unit = normalize_unit(&item.unit);
    if item.category.trim().is_empty() {
        item.category = categorize(None, &item.name);
    }
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_spellings_collapse() {
        assert_eq!(normalize_unit("Tablespoons"), "tbsp");
        assert_eq!(normalize_unit("tbsp."), "tbsp");
        assert_eq!(normalize_unit("cloves"), "clove");
        assert_eq!(normalize_unit("pieces"), "");
        assert_eq!(normalize_unit("bunch"), "bunch");
    }

    #[test]
    fn test_categorize_prefers_aisle() {
        assert_eq!(categorize(Some("Milk, Eggs, Other Dairy"), "butter"), "Dairy & Eggs");
        assert_eq!(categorize(Some("Gourmet"), "truffle"), "Gourmet");
        assert_eq!(categorize(None, "Chicken Breast"), "Meat & Seafood");
        assert_eq!(categorize(None, "cherry tomatoes"), "Produce");
        assert_eq!(categorize(None, "eggplant"), "Produce");
        assert_eq!(categorize(None, "mystery"), DEFAULT_CATEGORY);
    }

    #[test]
    fn test_servings_factor() {
        assert!((servings_factor(4, 2) - 2.0).abs() < f64::EPSILON);
        assert!((servings_factor(0, 2) - 1.0).abs() < f64::EPSILON);
        assert!((servings_factor(3, 0) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_prepare_item_rejects_negative_amount() {
        let item = GroceryItem {
            name: "milk".into(),
            amount: -1.0,
            unit: "l".into(),
            category: String::new(),
            checked: false,
        };
        assert!(prepare_item(item).is_err());
    }
}
