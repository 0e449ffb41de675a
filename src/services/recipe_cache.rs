// ABOUTME: Cache-aside layer in front of the external recipe API
// ABOUTME: Combines the TTL cache, outbound rate limiter, daily quota and recipe mirroring
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Recipe Cache Service
//!
//! Every upstream operation follows the same path:
//!
//! 1. Look the normalized request up in the cache and return on a hit.
//! 2. On a miss, check the outbound limiter and the daily quota. Either one
//!    rejects with 429 before anything is sent upstream.
//! 3. Call upstream, account the reported points in memory and in the
//!    `api_usage` table, then cache the result with the resource TTL.
//!
//! Recipe details are also mirrored into the `recipes` table keyed by their
//! Spoonacular id, so a details lookup that misses the cache can still be
//! served from a fresh mirror row.

use crate::cache::factory::Cache;
use crate::cache::{CacheKey, CacheResource, CacheStats};
use crate::constants::cache::RECIPE_CACHE_NAMESPACE;
use crate::constants::service_names::SPOONACULAR;
use crate::constants::spoonacular::{
    ENDPOINT_AUTOCOMPLETE, ENDPOINT_COMPLEX_SEARCH, ENDPOINT_FIND_BY_INGREDIENTS,
    ENDPOINT_RANDOM, ENDPOINT_RECIPE_INFORMATION, MAX_RESULTS_PER_REQUEST, OUTBOUND_LIMITER_KEY,
};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::external::{ApiResponse, RecipeApi, RecipeSuggestion};
use crate::logging::AppLogger;
use crate::models::{IngredientMatch, Recipe, RecipeQuery, RecipeSummary, SearchPage};
use crate::rate_limiting::{ApiQuotaTracker, FixedWindowRateLimiter, QuotaStatus};
use chrono::{Duration as ChronoDuration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Cached, quota-aware access to the external recipe API
pub struct RecipeCacheService {
    api: Option<Arc<dyn RecipeApi>>,
    cache: Cache,
    database: Database,
    outbound_limiter: FixedWindowRateLimiter,
    quota: ApiQuotaTracker,
}

impl RecipeCacheService {
    /// Create the service. `api` is `None` when no Spoonacular key is configured.
    #[must_use]
    pub fn new(
        api: Option<Arc<dyn RecipeApi>>,
        cache: Cache,
        database: Database,
        requests_per_minute: u32,
        quota: ApiQuotaTracker,
    ) -> Self {
        Self {
            api,
            cache,
            database,
            outbound_limiter: FixedWindowRateLimiter::new(
                requests_per_minute,
                Duration::from_secs(60),
            ),
            quota,
        }
    }

    /// Build a quota tracker that resumes from today's persisted usage
    ///
    /// # Errors
    ///
    /// Returns an error if the usage table cannot be read
    pub async fn restore_quota(database: &Database, daily_limit: u32) -> AppResult<ApiQuotaTracker> {
        let today = Utc::now().date_naive();
        let used = database.api_points_for_day(today).await?;
        if used > 0 {
            debug!(used, daily_limit, "Restored today's Spoonacular usage");
        }
        Ok(ApiQuotaTracker::with_usage(daily_limit, today, used))
    }

    /// Whether an upstream API is configured
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.api.is_some()
    }

    /// Underlying cache
    #[must_use]
    pub const fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Today's quota state
    #[must_use]
    pub fn quota_status(&self) -> QuotaStatus {
        self.quota.status()
    }

    /// Cache counters
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot report stats
    pub async fn cache_stats(&self) -> AppResult<CacheStats> {
        self.cache.stats().await
    }

    /// Search upstream recipes; an external id appears at most once per page
    ///
    /// # Errors
    ///
    /// Returns 429 when the limiter or quota rejects, 503 without an API, or
    /// the upstream error
    pub async fn search(&self, query: &RecipeQuery) -> AppResult<SearchPage<RecipeSummary>> {
        let mut upstream_query = query.clone();
        upstream_query.limit = query.effective_limit().min(MAX_RESULTS_PER_REQUEST);

        self.cached(
            CacheResource::recipe_search(&upstream_query),
            ENDPOINT_COMPLEX_SEARCH,
            |api| async move {
                let mut response = api.search_recipes(&upstream_query).await?;
                dedup_by_external_id(&mut response.data.results);
                Ok(response)
            },
        )
        .await
    }

    /// Full recipe for a Spoonacular id, mirrored into the recipes table
    ///
    /// # Errors
    ///
    /// Returns 404 when upstream does not know the id, 429 when the limiter
    /// or quota rejects, or a database error when mirroring fails
    pub async fn get_recipe(&self, external_id: i64) -> AppResult<Recipe> {
        let key = CacheKey::recipes(CacheResource::RecipeDetails { external_id });
        let started = Instant::now();

        if let Some(recipe) = self.read_cache::<Recipe>(&key).await {
            AppLogger::log_external_call(
                ENDPOINT_RECIPE_INFORMATION,
                true,
                0,
                elapsed_ms(started),
            );
            return Ok(recipe);
        }

        let ttl = self.cache.ttl_for(&key);
        if let Some(mirror) = self.fresh_mirror(external_id, ttl).await? {
            debug!(external_id, "Serving recipe details from mirror");
            self.write_cache(&key, &mirror, ttl).await;
            return Ok(mirror);
        }

        let external = self
            .call_upstream(ENDPOINT_RECIPE_INFORMATION, |api| async move {
                api.get_recipe(external_id).await
            })
            .await?;
        let mirrored = self
            .database
            .upsert_external_recipe(&external.into_recipe())
            .await?;
        self.write_cache(&key, &mirrored, ttl).await;
        Ok(mirrored)
    }

    /// Recipes that use the given ingredients
    ///
    /// # Errors
    ///
    /// Returns 400 for an empty ingredient list, otherwise as [`search`](Self::search)
    pub async fn find_by_ingredients(
        &self,
        ingredients: &[String],
        number: u32,
    ) -> AppResult<Vec<IngredientMatch>> {
        if ingredients.iter().all(|i| i.trim().is_empty()) {
            return Err(AppError::invalid_input("At least one ingredient is required"));
        }
        let number = clamp_number(number);
        self.cached(
            CacheResource::by_ingredients(ingredients, number),
            ENDPOINT_FIND_BY_INGREDIENTS,
            |api| async move { api.find_by_ingredients(ingredients, number).await },
        )
        .await
    }

    /// Random recipes, optionally filtered by tags
    ///
    /// # Errors
    ///
    /// As [`search`](Self::search)
    pub async fn random(&self, tags: &[String], number: u32) -> AppResult<Vec<RecipeSummary>> {
        let number = clamp_number(number);
        self.cached(CacheResource::random(tags, number), ENDPOINT_RANDOM, |api| async move {
            api.random_recipes(tags, number).await
        })
        .await
    }

    /// Title suggestions; a blank prefix yields nothing without calling upstream
    ///
    /// # Errors
    ///
    /// As [`search`](Self::search)
    pub async fn autocomplete(&self, query: &str, number: u32) -> AppResult<Vec<RecipeSuggestion>> {
        let prefix = query.trim();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        let number = clamp_number(number);
        self.cached(
            CacheResource::autocomplete(prefix, number),
            ENDPOINT_AUTOCOMPLETE,
            |api| async move { api.autocomplete(prefix, number).await },
        )
        .await
    }

    /// Drop every cached search, returning how many entries were removed
    ///
    /// # Errors
    ///
    /// Returns an error if the cache rejects the pattern
    pub async fn invalidate_search_cache(&self) -> AppResult<u64> {
        self.cache
            .invalidate_pattern(&CacheKey::search_pattern(RECIPE_CACHE_NAMESPACE))
            .await
    }

    /// Drop every cached entry
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be cleared
    pub async fn clear(&self) -> AppResult<()> {
        self.cache.clear_all().await
    }

    async fn cached<T, F, Fut>(
        &self,
        resource: CacheResource,
        endpoint: &'static str,
        fetch: F,
    ) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce(Arc<dyn RecipeApi>) -> Fut + Send,
        Fut: Future<Output = AppResult<ApiResponse<T>>> + Send,
    {
        let key = CacheKey::recipes(resource);
        let started = Instant::now();

        if let Some(value) = self.read_cache::<T>(&key).await {
            AppLogger::log_external_call(endpoint, true, 0, elapsed_ms(started));
            return Ok(value);
        }

        let value = self.call_upstream(endpoint, fetch).await?;
        self.write_cache(&key, &value, self.cache.ttl_for(&key)).await;
        Ok(value)
    }

    async fn call_upstream<T, F, Fut>(&self, endpoint: &'static str, fetch: F) -> AppResult<T>
    where
        F: FnOnce(Arc<dyn RecipeApi>) -> Fut + Send,
        Fut: Future<Output = AppResult<ApiResponse<T>>> + Send,
    {
        let api = self
            .api
            .clone()
            .ok_or_else(|| AppError::external_unavailable(SPOONACULAR))?;

        let decision = self.outbound_limiter.check(OUTBOUND_LIMITER_KEY);
        if !decision.allowed {
            warn!(endpoint, limit = decision.limit, "Outbound Spoonacular rate limit reached");
            return Err(decision.to_error());
        }
        self.quota.check_available(1)?;

        let started = Instant::now();
        let response = fetch(api).await?;
        let cost = response.quota_cost;
        let status = self.quota.record(cost);

        if let Err(e) = self
            .database
            .record_api_usage(status.day, endpoint, cost)
            .await
        {
            warn!(endpoint, error = %e, "Failed to persist Spoonacular usage");
        }
        AppLogger::log_external_call(endpoint, false, cost, elapsed_ms(started));
        AppLogger::log_quota_usage(status.used, status.limit);

        Ok(response.data)
    }

    async fn read_cache<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        match self.cache.get::<T>(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(%key, error = %e, "Discarding unreadable cache entry");
                if let Err(e) = self.cache.invalidate(key).await {
                    warn!(%key, error = %e, "Failed to invalidate cache entry");
                }
                None
            }
        }
    }

    async fn write_cache<T: Serialize + Send + Sync>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        if let Err(e) = self.cache.set(key, value, ttl).await {
            warn!(%key, error = %e, "Failed to cache recipe API response");
        }
    }

    async fn fresh_mirror(&self, external_id: i64, ttl: Duration) -> AppResult<Option<Recipe>> {
        let Some(mirror) = self.database.get_recipe_by_external_id(external_id).await? else {
            return Ok(None);
        };
        let max_age = ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::days(1));
        Ok((Utc::now() - mirror.updated_at < max_age).then_some(mirror))
    }
}

fn clamp_number(number: u32) -> u32 {
    number.clamp(1, MAX_RESULTS_PER_REQUEST)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Keep the first entry for each external id; entries without one are kept
pub fn dedup_by_external_id(results: &mut Vec<RecipeSummary>) {
    let mut seen = HashSet::new();
    results.retain(|r| r.external_id.is_none_or(|id| seen.insert(id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecipeOrigin;

    fn summary(external_id: Option<i64>, title: &str) -> RecipeSummary {
        RecipeSummary {
            id: None,
            external_id,
            title: title.into(),
            image_url: None,
            ready_in_minutes: None,
            servings: None,
            average_rating: None,
            origin: RecipeOrigin::Spoonacular,
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut results = vec![
            summary(Some(1), "first"),
            summary(Some(2), "other"),
            summary(Some(1), "duplicate"),
            summary(None, "local"),
            summary(None, "local again"),
        ];
        dedup_by_external_id(&mut results);

        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["first", "other", "local", "local again"]);
    }

    #[test]
    fn test_clamp_number_bounds() {
        assert_eq!(clamp_number(0), 1);
        assert_eq!(clamp_number(500), MAX_RESULTS_PER_REQUEST);
    }
}
