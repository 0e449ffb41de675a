// ABOUTME: AI-assisted fridge analysis and natural-language recipe search
// ABOUTME: Uses the vision LLM to read ingredients and to turn free text into search filters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # AI Search
//!
//! Model replies are parsed leniently: the first JSON array or object in the
//! text wins, and ingredient lists fall back to comma or newline separated
//! names when no JSON is present.

use super::recipe_cache::RecipeCacheService;
use super::recipes::RecipeService;
use crate::constants::limits::DEFAULT_FRIDGE_RESULTS;
use crate::constants::service_names::LLM;
use crate::errors::{AppError, AppResult};
use crate::llm::prompts::{FRIDGE_ANALYSIS_PROMPT, FRIDGE_ANALYSIS_REQUEST, RECIPE_QUERY_PROMPT};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::models::{IngredientMatch, RecipeQuery, RecipeSummary, SearchPage};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Deserializer, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ingredient lists are short; cap the reply
const FRIDGE_MAX_TOKENS: u32 = 300;

/// Body of a fridge analysis request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FridgeAnalysisRequest {
    /// Photo as an http(s) URL, a data URL or raw base64
    #[serde(default)]
    pub image: Option<String>,
    /// Ingredients typed by the user
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// How many recipes to suggest
    #[serde(default)]
    pub number: Option<u32>,
}

/// Detected ingredients with matching recipes
#[derive(Debug, Clone, Serialize)]
pub struct FridgeAnalysis {
    /// Normalized ingredient names used for the lookup
    pub ingredients: Vec<String>,
    /// Whether the model contributed ingredients
    pub detected_by_ai: bool,
    /// Matches, most used ingredients first, fewest missing next
    pub recipes: Vec<IngredientMatch>,
}

/// Natural-language search outcome
#[derive(Debug, Clone, Serialize)]
pub struct AiSearchResult {
    /// Filters the request was turned into
    pub query: RecipeQuery,
    /// Whether the model produced the filters
    pub interpreted_by_ai: bool,
    /// Search results for those filters
    pub results: SearchPage<RecipeSummary>,
}

/// Filters as the model is asked to return them
#[derive(Debug, Default, Deserialize)]
struct LlmQuery {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    cuisine: Option<String>,
    #[serde(default)]
    diet: Option<String>,
    #[serde(default)]
    intolerances: Option<String>,
    #[serde(default, rename = "type")]
    dish_type: Option<String>,
    #[serde(default)]
    max_ready_time: Option<u32>,
}

/// Fridge analysis and AI search
#[derive(Clone)]
pub struct AiSearchService {
    llm: Option<Arc<dyn LlmProvider>>,
    recipe_cache: Arc<RecipeCacheService>,
    recipes: RecipeService,
}

impl AiSearchService {
    /// Create the service; `llm` is `None` when AI features are disabled
    #[must_use]
    pub fn new(
        llm: Option<Arc<dyn LlmProvider>>,
        recipe_cache: Arc<RecipeCacheService>,
        recipes: RecipeService,
    ) -> Self {
        Self {
            llm,
            recipe_cache,
            recipes,
        }
    }

    /// Whether a model is configured
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.llm.is_some()
    }

    /// Find recipes for what is in the fridge
    ///
    /// # Errors
    ///
    /// Returns 503 when only an image is given and no model is configured,
    /// 400 when no ingredients could be determined, or the lookup error
    pub async fn analyze_fridge(&self, request: FridgeAnalysisRequest) -> AppResult<FridgeAnalysis> {
        let mut names = request.ingredients;
        let mut detected_by_ai = false;

        if let Some(image) = request.image.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
            match &self.llm {
                Some(llm) => {
                    let detected = Self::detect_ingredients(llm.as_ref(), image).await?;
                    detected_by_ai = !detected.is_empty();
                    names.extend(detected);
                }
                None if names.is_empty() => return Err(AppError::external_unavailable(LLM)),
                None => warn!("Ignoring fridge image because no vision model is configured"),
            }
        }

        let ingredients = normalize_ingredients(names);
        if ingredients.is_empty() {
            return Err(AppError::invalid_input("No ingredients could be identified"));
        }

        let number = request.number.unwrap_or(DEFAULT_FRIDGE_RESULTS);
        let mut recipes = self
            .recipe_cache
            .find_by_ingredients(&ingredients, number)
            .await?;
        rank_matches(&mut recipes);

        info!(
            ingredients = ingredients.len(),
            matches = recipes.len(),
            detected_by_ai,
            "Fridge analysis complete"
        );
        Ok(FridgeAnalysis {
            ingredients,
            detected_by_ai,
            recipes,
        })
    }

    /// Turn free text into filters and run the search
    ///
    /// # Errors
    ///
    /// Returns 400 for blank text or the search error
    pub async fn natural_language_search(&self, text: &str, limit: u32) -> AppResult<AiSearchResult> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::invalid_input("Search text is required"));
        }

        let (mut query, interpreted_by_ai) = self.interpret(text).await;
        query.limit = limit;
        let results = self.recipes.search(&query).await?;

        Ok(AiSearchResult {
            query,
            interpreted_by_ai,
            results,
        })
    }

    async fn interpret(&self, text: &str) -> (RecipeQuery, bool) {
        let Some(llm) = &self.llm else {
            return (RecipeQuery::text(text), false);
        };

        let request = ChatRequest::new(vec![
            ChatMessage::system(RECIPE_QUERY_PROMPT),
            ChatMessage::user(text),
        ])
        .with_temperature(0.0);

        match llm.complete(&request).await {
            Ok(response) => parse_recipe_query(&response.content).map_or_else(
                || {
                    debug!(reply = %response.content, "Model reply held no usable filters");
                    (RecipeQuery::text(text), false)
                },
                |query| (query, true),
            ),
            Err(e) => {
                warn!(error = %e, "Model unavailable for search, using plain text query");
                (RecipeQuery::text(text), false)
            }
        }
    }

    async fn detect_ingredients(llm: &dyn LlmProvider, image: &str) -> AppResult<Vec<String>> {
        if !llm.supports_vision() {
            return Err(AppError::invalid_input(format!(
                "Configured model provider '{}' cannot read images",
                llm.name()
            )));
        }
        let request = ChatRequest::new(vec![
            ChatMessage::system(FRIDGE_ANALYSIS_PROMPT),
            ChatMessage::user_with_image(FRIDGE_ANALYSIS_REQUEST, image_url(image)?),
        ])
        .with_temperature(0.0)
        .with_max_tokens(FRIDGE_MAX_TOKENS);

        let response = llm.complete(&request).await?;
        Ok(parse_ingredient_list(&response.content))
    }
}

/// Accept http(s) and data URLs as they are and wrap raw base64 as a JPEG data URL
///
/// # Errors
///
/// Returns 400 when the value is neither a URL nor valid base64
pub fn image_url(image: &str) -> AppResult<String> {
    if image.starts_with("data:image/")
        || image.starts_with("https://")
        || image.starts_with("http://")
    {
        return Ok(image.to_owned());
    }
    let compact: String = image.split_whitespace().collect();
    STANDARD
        .decode(&compact)
        .map_err(|_| AppError::invalid_format("Image must be a URL or base64 encoded"))?;
    Ok(format!("data:image/jpeg;base64,{compact}"))
}

/// Ingredient names from a model reply
#[must_use]
pub fn parse_ingredient_list(reply: &str) -> Vec<String> {
    if let Some(values) = first_json(reply, '[').and_then(|v| match v {
        Value::Array(values) => Some(values),
        _ => None,
    }) {
        return values
            .into_iter()
            .filter_map(|value| match value {
                Value::String(name) => Some(name),
                Value::Object(mut map) => match map.remove("name") {
                    Some(Value::String(name)) => Some(name),
                    _ => None,
                },
                _ => None,
            })
            .collect();
    }

    reply
        .split([',', '\n'])
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c == '-' || c == '*' || c == '•')
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                .trim()
                .to_owned()
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Search filters from a model reply, `None` when nothing usable was found
#[must_use]
pub fn parse_recipe_query(reply: &str) -> Option<RecipeQuery> {
    let parsed: LlmQuery = first_json(reply, '{').and_then(|v| serde_json::from_value(v).ok())?;
    let clean = |value: Option<String>| value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

    let query = RecipeQuery {
        query: clean(parsed.query),
        cuisine: clean(parsed.cuisine),
        diet: clean(parsed.diet),
        intolerances: clean(parsed.intolerances),
        dish_type: clean(parsed.dish_type),
        max_ready_time: parsed.max_ready_time,
        ..RecipeQuery::text(String::new())
    };
    let has_filter = query.query.is_some()
        || query.cuisine.is_some()
        || query.diet.is_some()
        || query.intolerances.is_some()
        || query.dish_type.is_some()
        || query.max_ready_time.is_some();
    has_filter.then_some(query)
}

/// Trim, lower-case and deduplicate while keeping first-seen order
#[must_use]
pub fn normalize_ingredients(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            name.split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .trim_matches(|c: char| c == '.' || c == '"' || c == '\'')
                .to_lowercase()
        })
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}

/// Most used ingredients first, then fewest missing
pub fn rank_matches(matches: &mut [IngredientMatch]) {
    matches.sort_by(|a, b| {
        b.used_ingredient_count
            .cmp(&a.used_ingredient_count)
            .then_with(|| a.missed_ingredient_count.cmp(&b.missed_ingredient_count))
    });
}

/// First JSON value opened by `open` that parses; trailing text is ignored
fn first_json(text: &str, open: char) -> Option<Value> {
    text.match_indices(open).find_map(|(start, _)| {
        Deserializer::from_str(&text[start..])
            .into_iter::<Value>()
            .next()
            .and_then(Result::ok)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingredients_from_fenced_json() {
        let reply = "Sure! ```json\n[\"Eggs\", \"cheddar cheese\", {\"name\": \"milk\"}]\n```";
        assert_eq!(
            parse_ingredient_list(reply),
            vec!["Eggs", "cheddar cheese", "milk"]
        );
    }

    #[test]
    fn test_parse_ingredients_ignores_later_brackets() {
        let reply = "I can see: [\"eggs\", \"milk\"]\nConfidence notes: [high]";
        assert_eq!(parse_ingredient_list(reply), vec!["eggs", "milk"]);

        let reply = "Notes [partly hidden] then [\"butter\"]";
        assert_eq!(parse_ingredient_list(reply), vec!["butter"]);
    }

    #[test]
    fn test_parse_ingredients_falls_back_to_lines() {
        let reply = "1. tomato\n2. basil\n- olive oil, garlic";
        assert_eq!(
            parse_ingredient_list(reply),
            vec!["tomato", "basil", "olive oil", "garlic"]
        );
    }

    #[test]
    fn test_normalize_dedups_case_insensitively() {
        let names = vec![" Tomato ".into(), "tomato".into(), "Red  Onion.".into(), String::new()];
        assert_eq!(normalize_ingredients(names), vec!["tomato", "red onion"]);
    }

    #[test]
    fn test_parse_recipe_query_reads_type_and_time() {
        let reply = "{\"query\": \"pasta\", \"type\": \"main course\", \"max_ready_time\": 30}";
        let query = parse_recipe_query(reply).unwrap();
        assert_eq!(query.query.as_deref(), Some("pasta"));
        assert_eq!(query.dish_type.as_deref(), Some("main course"));
        assert_eq!(query.max_ready_time, Some(30));
        assert!(parse_recipe_query("{}").is_none());
        assert!(parse_recipe_query("no json here").is_none());
    }

    #[test]
    fn test_image_url_wraps_raw_base64() {
        assert_eq!(image_url("aGVsbG8=").unwrap(), "data:image/jpeg;base64,aGVsbG8=");
        assert_eq!(
            image_url("https://img.example.com/fridge.jpg").unwrap(),
            "https://img.example.com/fridge.jpg"
        );
        assert!(image_url("not base64 !!").is_err());
    }
}
