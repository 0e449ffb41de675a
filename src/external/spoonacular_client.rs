// ABOUTME: Spoonacular REST API client for recipe search and details
// ABOUTME: Maps upstream JSON to domain models and reports per-call quota points

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Spoonacular API Client
//!
//! The API key travels as the `apiKey` query parameter. Each response carries
//! its point cost in the `x-api-quota-request` header.
//!
//! # API Reference
//! Spoonacular food API: <https://spoonacular.com/food-api/docs>

use super::{ApiResponse, RecipeApi, RecipeSuggestion};
use crate::config::SpoonacularConfig;
use crate::constants::service_names;
use crate::constants::spoonacular::{
    ENDPOINT_AUTOCOMPLETE, ENDPOINT_COMPLEX_SEARCH, ENDPOINT_FIND_BY_INGREDIENTS,
    ENDPOINT_RANDOM, ENDPOINT_RECIPE_INFORMATION, MAX_RESULTS_PER_REQUEST, QUOTA_REQUEST_HEADER,
};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{
    ExternalRecipe, Ingredient, IngredientMatch, NutritionInfo, RecipeOrigin, RecipeQuery,
    RecipeSummary, SearchPage,
};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComplexSearchResponse {
    #[serde(default)]
    results: Vec<SearchResultItem>,
    #[serde(default)]
    offset: u32,
    #[serde(default)]
    number: u32,
    #[serde(default)]
    total_results: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultItem {
    id: i64,
    title: String,
    image: Option<String>,
    ready_in_minutes: Option<u32>,
    servings: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipeInformation {
    id: i64,
    title: String,
    summary: Option<String>,
    image: Option<String>,
    ready_in_minutes: Option<u32>,
    servings: Option<u32>,
    #[serde(default)]
    cuisines: Vec<String>,
    #[serde(default)]
    dish_types: Vec<String>,
    #[serde(default)]
    diets: Vec<String>,
    #[serde(default)]
    extended_ingredients: Vec<ExtendedIngredient>,
    #[serde(default)]
    analyzed_instructions: Vec<AnalyzedInstruction>,
    instructions: Option<String>,
    nutrition: Option<NutritionBlock>,
    source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtendedIngredient {
    name: Option<String>,
    #[serde(rename = "nameClean")]
    name_clean: Option<String>,
    amount: Option<f64>,
    unit: Option<String>,
    original: Option<String>,
    aisle: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnalyzedInstruction {
    #[serde(default)]
    steps: Vec<InstructionStep>,
}

#[derive(Debug, Deserialize)]
struct InstructionStep {
    step: String,
}

#[derive(Debug, Deserialize)]
struct NutritionBlock {
    #[serde(default)]
    nutrients: Vec<Nutrient>,
}

#[derive(Debug, Deserialize)]
struct Nutrient {
    name: String,
    amount: f64,
}

#[derive(Debug, Deserialize)]
struct RandomResponse {
    #[serde(default)]
    recipes: Vec<RecipeInformation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindByIngredientsItem {
    id: i64,
    title: String,
    image: Option<String>,
    #[serde(default)]
    used_ingredient_count: u32,
    #[serde(default)]
    missed_ingredient_count: u32,
    #[serde(default)]
    used_ingredients: Vec<NamedIngredient>,
    #[serde(default)]
    missed_ingredients: Vec<NamedIngredient>,
    #[serde(default)]
    likes: u32,
}

#[derive(Debug, Deserialize)]
struct NamedIngredient {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AutocompleteItem {
    id: i64,
    title: String,
}

impl From<RecipeInformation> for ExternalRecipe {
    fn from(info: RecipeInformation) -> Self {
        let mut instructions: Vec<String> = info
            .analyzed_instructions
            .into_iter()
            .flat_map(|block| block.steps)
            .map(|s| s.step.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
        // Some recipes only carry a free-text (often HTML) instructions field
        if instructions.is_empty() {
            if let Some(text) = info.instructions {
                let text = text
                    .replace("</li>", "\n")
                    .replace("</p>", "\n")
                    .replace("<br>", "\n");
                instructions = strip_tags(&text)
                    .lines()
                    .map(|s| s.trim().to_owned())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
        }

        let ingredients = info
            .extended_ingredients
            .into_iter()
            .filter_map(|i| {
                let name = i.name_clean.or(i.name)?;
                Some(Ingredient {
                    name,
                    amount: i.amount.unwrap_or(0.0),
                    unit: i.unit.unwrap_or_default(),
                    original: i.original,
                    aisle: i.aisle,
                })
            })
            .collect();

        Self {
            external_id: info.id,
            title: info.title,
            summary: info.summary,
            image_url: info.image,
            ready_in_minutes: info.ready_in_minutes,
            servings: info.servings.unwrap_or(1),
            cuisines: info.cuisines,
            dish_types: info.dish_types,
            diets: info.diets,
            ingredients,
            instructions,
            nutrition: info.nutrition.map(nutrition_from_block),
            source_url: info.source_url,
        }
    }
}

fn nutrition_from_block(block: NutritionBlock) -> NutritionInfo {
    let mut nutrition = NutritionInfo::default();
    for nutrient in block.nutrients {
        match nutrient.name.as_str() {
            "Calories" => nutrition.calories = nutrient.amount,
            "Protein" => nutrition.protein_g = nutrient.amount,
            "Fat" => nutrition.fat_g = nutrient.amount,
            "Carbohydrates" => nutrition.carbs_g = nutrient.amount,
            _ => {}
        }
    }
    nutrition
}

fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn summary_from_search(item: SearchResultItem) -> RecipeSummary {
    RecipeSummary {
        id: None,
        external_id: Some(item.id),
        title: item.title,
        image_url: item.image,
        ready_in_minutes: item.ready_in_minutes,
        servings: item.servings,
        average_rating: None,
        origin: RecipeOrigin::Spoonacular,
    }
}

fn summary_from_information(info: &RecipeInformation) -> RecipeSummary {
    RecipeSummary {
        id: None,
        external_id: Some(info.id),
        title: info.title.clone(),
        image_url: info.image.clone(),
        ready_in_minutes: info.ready_in_minutes,
        servings: info.servings,
        average_rating: None,
        origin: RecipeOrigin::Spoonacular,
    }
}

/// Point cost reported by the upstream, 1 when absent or unparsable
fn quota_cost(headers: &HeaderMap) -> u32 {
    headers
        .get(QUOTA_REQUEST_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map_or(1, |v| {
            // Fractional points round up
            let rounded = v.ceil();
            if rounded > f64::from(u32::MAX) {
                u32::MAX
            } else {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let points = rounded as u32;
                points
            }
        })
}

fn error_for_status(status: StatusCode, body: &str) -> AppError {
    let service = service_names::SPOONACULAR;
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::new(
            ErrorCode::ExternalAuthFailed,
            format!("{service} rejected the API key"),
        ),
        StatusCode::PAYMENT_REQUIRED => AppError::new(
            ErrorCode::QuotaExceeded,
            format!("{service} daily quota exhausted upstream"),
        ),
        StatusCode::NOT_FOUND => AppError::not_found("External recipe"),
        StatusCode::TOO_MANY_REQUESTS => AppError::new(
            ErrorCode::ExternalRateLimited,
            format!("{service} is rate limiting requests"),
        ),
        _ => AppError::external_service(service, format!("HTTP {status}: {body}")),
    }
}

/// Spoonacular API client
#[derive(Clone)]
pub struct SpoonacularClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl SpoonacularClient {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when no API key is configured or the HTTP client
    /// cannot be built
    pub fn new(config: &SpoonacularConfig) -> AppResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::config("SPOONACULAR_API_KEY is not set"))?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<ApiResponse<T>> {
        let url = format!("{}{path}", self.base_url);
        debug!(endpoint = %path, "Calling Spoonacular");

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let cost = quota_cost(response.headers());
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint = %path, status = status.as_u16(), "Spoonacular request failed");
            return Err(error_for_status(status, &body));
        }

        let data = response.json::<T>().await.map_err(|e| {
            AppError::external_service(
                service_names::SPOONACULAR,
                format!("JSON parse error: {e}"),
            )
        })?;
        Ok(ApiResponse::new(data, cost))
    }
}

fn clamp_number(number: u32) -> String {
    number.clamp(1, MAX_RESULTS_PER_REQUEST).to_string()
}

#[async_trait]
impl RecipeApi for SpoonacularClient {
    async fn search_recipes(
        &self,
        query: &RecipeQuery,
    ) -> AppResult<ApiResponse<SearchPage<RecipeSummary>>> {
        let mut params = vec![
            ("number", clamp_number(query.effective_limit())),
            ("offset", query.offset.to_string()),
            ("addRecipeInformation", "true".to_owned()),
        ];
        if let Some(text) = query.text_query() {
            params.push(("query", text.to_owned()));
        }
        let optional = [
            ("cuisine", &query.cuisine),
            ("diet", &query.diet),
            ("intolerances", &query.intolerances),
            ("type", &query.dish_type),
        ];
        for (name, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                params.push((name, value.trim().to_owned()));
            }
        }
        if let Some(max) = query.max_ready_time {
            params.push(("maxReadyTime", max.to_string()));
        }

        let response: ApiResponse<ComplexSearchResponse> =
            self.get_json(ENDPOINT_COMPLEX_SEARCH, &params).await?;
        let body = response.data;
        let page = SearchPage {
            results: body.results.into_iter().map(summary_from_search).collect(),
            offset: body.offset,
            limit: body.number,
            total_results: body.total_results,
        };
        Ok(ApiResponse::new(page, response.quota_cost))
    }

    async fn get_recipe(&self, external_id: i64) -> AppResult<ApiResponse<ExternalRecipe>> {
        let path = ENDPOINT_RECIPE_INFORMATION.replace("{id}", &external_id.to_string());
        let response: ApiResponse<RecipeInformation> = self
            .get_json(&path, &[("includeNutrition", "true".to_owned())])
            .await?;
        Ok(ApiResponse::new(
            ExternalRecipe::from(response.data),
            response.quota_cost,
        ))
    }

    async fn find_by_ingredients(
        &self,
        ingredients: &[String],
        number: u32,
    ) -> AppResult<ApiResponse<Vec<IngredientMatch>>> {
        if ingredients.is_empty() {
            return Err(AppError::invalid_input("At least one ingredient is required"));
        }
        let params = [
            ("ingredients", ingredients.join(",")),
            ("number", clamp_number(number)),
            ("ranking", "1".to_owned()),
            ("ignorePantry", "true".to_owned()),
        ];
        let response: ApiResponse<Vec<FindByIngredientsItem>> =
            self.get_json(ENDPOINT_FIND_BY_INGREDIENTS, &params).await?;

        let matches = response
            .data
            .into_iter()
            .map(|item| IngredientMatch {
                external_id: item.id,
                title: item.title,
                image_url: item.image,
                used_ingredient_count: item.used_ingredient_count,
                missed_ingredient_count: item.missed_ingredient_count,
                used_ingredients: item.used_ingredients.into_iter().map(|i| i.name).collect(),
                missed_ingredients: item.missed_ingredients.into_iter().map(|i| i.name).collect(),
                likes: item.likes,
            })
            .collect();
        Ok(ApiResponse::new(matches, response.quota_cost))
    }

    async fn random_recipes(
        &self,
        tags: &[String],
        number: u32,
    ) -> AppResult<ApiResponse<Vec<RecipeSummary>>> {
        let mut params = vec![("number", clamp_number(number))];
        if !tags.is_empty() {
            params.push(("include-tags", tags.join(",")));
        }
        let response: ApiResponse<RandomResponse> =
            self.get_json(ENDPOINT_RANDOM, &params).await?;
        let summaries = response
            .data
            .recipes
            .iter()
            .map(summary_from_information)
            .collect();
        Ok(ApiResponse::new(summaries, response.quota_cost))
    }

    async fn autocomplete(
        &self,
        query: &str,
        number: u32,
    ) -> AppResult<ApiResponse<Vec<RecipeSuggestion>>> {
        let params = [("query", query.to_owned()), ("number", clamp_number(number))];
        let response: ApiResponse<Vec<AutocompleteItem>> =
            self.get_json(ENDPOINT_AUTOCOMPLETE, &params).await?;
        let suggestions = response
            .data
            .into_iter()
            .map(|item| RecipeSuggestion {
                external_id: item.id,
                title: item.title,
            })
            .collect();
        Ok(ApiResponse::new(suggestions, response.quota_cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_quota_cost_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(quota_cost(&headers), 1);

        headers.insert(QUOTA_REQUEST_HEADER, HeaderValue::from_static("3"));
        assert_eq!(quota_cost(&headers), 3);

        headers.insert(QUOTA_REQUEST_HEADER, HeaderValue::from_static("1.1"));
        assert_eq!(quota_cost(&headers), 2);

        headers.insert(QUOTA_REQUEST_HEADER, HeaderValue::from_static("garbage"));
        assert_eq!(quota_cost(&headers), 1);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            error_for_status(StatusCode::PAYMENT_REQUIRED, "").code,
            ErrorCode::QuotaExceeded
        );
        assert_eq!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, "").code,
            ErrorCode::ExternalRateLimited
        );
        assert_eq!(
            error_for_status(StatusCode::UNAUTHORIZED, "").code,
            ErrorCode::ExternalAuthFailed
        );
        assert_eq!(
            error_for_status(StatusCode::BAD_GATEWAY, "oops").code,
            ErrorCode::ExternalServiceError
        );
    }

    #[test]
    fn test_recipe_information_mapping() {
        let json = serde_json::json!({
            "id": 716_429,
            "title": "Pasta with Garlic",
            "summary": "Tasty <b>pasta</b>",
            "image": "https://img.example/716429.jpg",
            "readyInMinutes": 45,
            "servings": 2,
            "cuisines": ["Italian"],
            "dishTypes": ["main course"],
            "diets": [],
            "extendedIngredients": [
                {"name": "garlic", "nameClean": "garlic", "amount": 2.0, "unit": "cloves",
                 "original": "2 cloves garlic", "aisle": "Produce"},
                {"amount": 1.0}
            ],
            "analyzedInstructions": [{"steps": [{"number": 1, "step": "Boil pasta."}, {"number": 2, "step": "Add garlic."}]}],
            "nutrition": {"nutrients": [
                {"name": "Calories", "amount": 543.0, "unit": "kcal"},
                {"name": "Protein", "amount": 17.0, "unit": "g"}
            ]},
            "sourceUrl": "https://example.com/pasta"
        });
        let info: RecipeInformation = serde_json::from_value(json).unwrap();
        let recipe = ExternalRecipe::from(info);

        assert_eq!(recipe.external_id, 716_429);
        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.ingredients[0].unit, "cloves");
        assert_eq!(recipe.instructions, vec!["Boil pasta.", "Add garlic."]);
        let nutrition = recipe.nutrition.unwrap();
        assert!((nutrition.calories - 543.0).abs() < f64::EPSILON);
        assert!((nutrition.protein_g - 17.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_free_text_instructions_fallback() {
        let json = serde_json::json!({
            "id": 1,
            "title": "Toast",
            "instructions": "<ol><li>Slice bread</li><li>Toast it</li></ol>"
        });
        let info: RecipeInformation = serde_json::from_value(json).unwrap();
        let recipe = ExternalRecipe::from(info);
        assert_eq!(recipe.servings, 1);
        assert_eq!(recipe.instructions, vec!["Slice bread", "Toast it"]);
    }
}
