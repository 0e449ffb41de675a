// ABOUTME: Cache abstraction layer for Spoonacular response caching
// ABOUTME: Pluggable backend trait, recipe cache keys with query normalization, and stats
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Cache factory for creating cache providers
pub mod factory;
/// In-memory cache implementation
pub mod memory;

use crate::constants::cache::{
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CLEANUP_INTERVAL_SECS, RECIPE_CACHE_NAMESPACE,
    TTL_AUTOCOMPLETE_SECS, TTL_RANDOM_RECIPES_SECS, TTL_RECIPE_DETAILS_SECS,
    TTL_RECIPE_SEARCH_SECS,
};
use crate::errors::AppResult;
use crate::models::RecipeQuery;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Cache provider trait for pluggable backend implementations
///
/// # Examples
///
/// ```rust,no_run
/// use smartplates_server::cache::{CacheConfig, CacheKey, CacheProvider, CacheResource};
/// use smartplates_server::cache::memory::InMemoryCache;
/// use std::time::Duration;
/// # async fn example() -> Result<(), smartplates_server::errors::AppError> {
///
/// let config = CacheConfig {
///     enable_background_cleanup: false,
///     ..Default::default()
/// };
/// let cache: InMemoryCache = InMemoryCache::new(config).await?;
///
/// let key = CacheKey::recipes(CacheResource::RecipeDetails { external_id: 716_429 });
/// cache.set(&key, &"Pasta with Garlic", Duration::from_secs(3600)).await?;
///
/// let cached: Option<String> = cache.get(&key).await?;
/// assert_eq!(cached.as_deref(), Some("Pasta with Garlic"));
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait CacheProvider: Send + Sync + Clone {
    /// Create new cache instance with configuration
    ///
    /// # Errors
    ///
    /// Returns an error if cache initialization fails
    async fn new(config: CacheConfig) -> AppResult<Self>
    where
        Self: Sized;

    /// Store value in cache with TTL
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or storage fails
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()>;

    /// Retrieve value from cache. Expired entries are discarded and read as a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails
    async fn get<T: for<'de> Deserialize<'de>>(&self, key: &CacheKey) -> AppResult<Option<T>>;

    /// Remove single cache entry
    ///
    /// # Errors
    ///
    /// Returns an error if invalidation fails
    async fn invalidate(&self, key: &CacheKey) -> AppResult<()>;

    /// Remove all cache entries matching a glob pattern (e.g. `"recipes:search:*"`)
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid glob
    async fn invalidate_pattern(&self, pattern: &str) -> AppResult<u64>;

    /// Check if key exists in cache
    ///
    /// # Errors
    ///
    /// Returns an error if existence check fails
    async fn exists(&self, key: &CacheKey) -> AppResult<bool>;

    /// Get remaining TTL for key
    ///
    /// # Errors
    ///
    /// Returns an error if TTL check fails
    async fn ttl(&self, key: &CacheKey) -> AppResult<Option<Duration>>;

    /// Verify cache backend is healthy
    ///
    /// # Errors
    ///
    /// Returns an error if health check fails
    async fn health_check(&self) -> AppResult<()>;

    /// Clear all cache entries (for testing/admin)
    ///
    /// # Errors
    ///
    /// Returns an error if clear operation fails
    async fn clear_all(&self) -> AppResult<()>;

    /// Snapshot of hit/miss/eviction counters
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot report stats
    async fn stats(&self) -> AppResult<CacheStats>;
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction
    pub max_entries: usize,
    /// Cleanup interval for expired entries
    pub cleanup_interval: Duration,
    /// Enable background cleanup task (should be false in tests to avoid runtime conflicts)
    pub enable_background_cleanup: bool,
    /// Cache TTL configuration
    pub ttl: CacheTtlConfig,
}

/// Cache TTL configuration for different resource types
#[derive(Debug, Clone)]
pub struct CacheTtlConfig {
    /// Search and find-by-ingredients TTL in seconds (default: 1 hour)
    pub search_secs: u64,
    /// Recipe details TTL in seconds (default: 24 hours)
    pub details_secs: u64,
    /// Random recipes TTL in seconds (default: 15 minutes)
    pub random_secs: u64,
    /// Autocomplete TTL in seconds (default: 6 hours)
    pub autocomplete_secs: u64,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            search_secs: TTL_RECIPE_SEARCH_SECS,
            details_secs: TTL_RECIPE_DETAILS_SECS,
            random_secs: TTL_RANDOM_RECIPES_SECS,
            autocomplete_secs: TTL_AUTOCOMPLETE_SECS,
        }
    }
}

impl CacheTtlConfig {
    /// Get TTL duration for a specific cache resource type
    #[must_use]
    pub const fn ttl_for_resource(&self, resource: &CacheResource) -> Duration {
        match resource {
            CacheResource::RecipeSearch { .. } | CacheResource::RecipesByIngredients { .. } => {
                Duration::from_secs(self.search_secs)
            }
            CacheResource::RecipeDetails { .. } => Duration::from_secs(self.details_secs),
            CacheResource::RandomRecipes { .. } => Duration::from_secs(self.random_secs),
            CacheResource::Autocomplete { .. } => Duration::from_secs(self.autocomplete_secs),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
            // Tests explicitly disable this
            enable_background_cleanup: true,
            ttl: CacheTtlConfig::default(),
        }
    }
}

/// Hit/miss/eviction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Live entries, including not-yet-swept expired ones
    pub entries: u64,
    /// Capacity before LRU eviction
    pub max_entries: u64,
    /// Reads served from cache
    pub hits: u64,
    /// Reads that found nothing or an expired entry
    pub misses: u64,
    /// Entries pushed out by LRU capacity
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed
    pub expirations: u64,
}

impl CacheStats {
    /// Fraction of reads served from cache, 0 when nothing was read
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Structured cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Key namespace
    pub namespace: String,
    /// Specific resource being cached
    pub resource: CacheResource,
}

impl CacheKey {
    /// Create new cache key
    #[must_use]
    pub const fn new(namespace: String, resource: CacheResource) -> Self {
        Self {
            namespace,
            resource,
        }
    }

    /// Key in the shared recipe namespace
    #[must_use]
    pub fn recipes(resource: CacheResource) -> Self {
        Self::new(RECIPE_CACHE_NAMESPACE.to_owned(), resource)
    }

    /// Pattern matching every cached search in a namespace
    #[must_use]
    pub fn search_pattern(namespace: &str) -> String {
        format!("{namespace}:search:*")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.resource)
    }
}

/// Cache resource types with specific parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheResource {
    /// Complex search, keyed by the normalized query string (1h TTL)
    RecipeSearch {
        /// Canonical `name=value&...` string
        query: String,
    },
    /// Full recipe information (24h TTL)
    RecipeDetails {
        /// Spoonacular id
        external_id: i64,
    },
    /// Find by ingredients (1h TTL)
    RecipesByIngredients {
        /// Normalized, sorted, comma joined ingredient names
        ingredients: String,
        /// Requested result count
        number: u32,
    },
    /// Random recipes (15min TTL)
    RandomRecipes {
        /// Normalized, sorted, comma joined tags
        tags: String,
        /// Requested result count
        number: u32,
    },
    /// Title autocomplete (6h TTL)
    Autocomplete {
        /// Normalized prefix
        query: String,
        /// Requested result count
        number: u32,
    },
}

impl CacheResource {
    /// Search resource for a query. Case, surrounding and repeated whitespace
    /// and parameter order do not change the key.
    #[must_use]
    pub fn recipe_search(query: &RecipeQuery) -> Self {
        let mut params: Vec<(&str, String)> = Vec::new();
        let mut push = |name, value: Option<&str>| {
            if let Some(v) = value.map(normalize_text).filter(|v| !v.is_empty()) {
                params.push((name, v));
            }
        };
        push("query", query.query.as_deref());
        push("cuisine", query.cuisine.as_deref());
        push("diet", query.diet.as_deref());
        push("intolerances", query.intolerances.as_deref().map(sort_list).as_deref());
        push("type", query.dish_type.as_deref());
        if let Some(max) = query.max_ready_time {
            params.push(("maxReadyTime", max.to_string()));
        }
        params.push(("number", query.effective_limit().to_string()));
        params.push(("offset", query.offset.to_string()));
        params.sort_by(|a, b| a.0.cmp(b.0));

        let canonical = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        Self::RecipeSearch { query: canonical }
    }

    /// Ingredients resource; ingredient order and case do not change the key
    #[must_use]
    pub fn by_ingredients(ingredients: &[String], number: u32) -> Self {
        Self::RecipesByIngredients {
            ingredients: normalize_list(ingredients),
            number,
        }
    }

    /// Random resource; tag order and case do not change the key
    #[must_use]
    pub fn random(tags: &[String], number: u32) -> Self {
        Self::RandomRecipes {
            tags: normalize_list(tags),
            number,
        }
    }

    /// Autocomplete resource
    #[must_use]
    pub fn autocomplete(query: &str, number: u32) -> Self {
        Self::Autocomplete {
            query: normalize_text(query),
            number,
        }
    }

    /// Short label used in logs and usage records
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RecipeSearch { .. } => "search",
            Self::RecipeDetails { .. } => "details",
            Self::RecipesByIngredients { .. } => "ingredients",
            Self::RandomRecipes { .. } => "random",
            Self::Autocomplete { .. } => "autocomplete",
        }
    }
}

impl fmt::Display for CacheResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecipeSearch { query } => write!(f, "search:{query}"),
            Self::RecipeDetails { external_id } => write!(f, "details:{external_id}"),
            Self::RecipesByIngredients {
                ingredients,
                number,
            } => write!(f, "ingredients:{ingredients}:n:{number}"),
            Self::RandomRecipes { tags, number } => write!(f, "random:{tags}:n:{number}"),
            Self::Autocomplete { query, number } => write!(f, "autocomplete:{query}:n:{number}"),
        }
    }
}

/// Trim, lower-case and collapse inner whitespace
#[must_use]
pub fn normalize_text(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalize each entry, drop blanks and duplicates, sort, join with commas
#[must_use]
pub fn normalize_list(values: &[String]) -> String {
    let mut normalized: Vec<String> = values
        .iter()
        .map(|v| normalize_text(v))
        .filter(|v| !v.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized.join(",")
}

fn sort_list(csv: &str) -> String {
    let parts: Vec<String> = csv.split(',').map(str::to_owned).collect();
    normalize_list(&parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_key_ignores_case_and_spacing() {
        let a = RecipeQuery::text("  Chicken   Curry ");
        let b = RecipeQuery::text("chicken curry");
        assert_eq!(
            CacheResource::recipe_search(&a),
            CacheResource::recipe_search(&b)
        );
    }

    #[test]
    fn test_search_key_distinguishes_filters_and_pages() {
        let plain = RecipeQuery::text("pasta");
        let vegan = RecipeQuery {
            diet: Some("Vegan".into()),
            ..RecipeQuery::text("pasta")
        };
        let second_page = RecipeQuery {
            offset: 20,
            ..RecipeQuery::text("pasta")
        };
        let plain_key = CacheResource::recipe_search(&plain);
        assert_ne!(plain_key, CacheResource::recipe_search(&vegan));
        assert_ne!(plain_key, CacheResource::recipe_search(&second_page));
    }

    #[test]
    fn test_search_key_is_sorted_query_string() {
        let query = RecipeQuery {
            cuisine: Some("Italian".into()),
            max_ready_time: Some(30),
            ..RecipeQuery::text("Pasta")
        };
        let key = CacheKey::recipes(CacheResource::recipe_search(&query));
        assert_eq!(
            key.to_string(),
            "recipes:search:cuisine=italian&maxReadyTime=30&number=20&offset=0&query=pasta"
        );
    }

    #[test]
    fn test_ingredient_key_order_independent() {
        let a = CacheResource::by_ingredients(&["Eggs".into(), " milk".into()], 5);
        let b = CacheResource::by_ingredients(&["milk".into(), "eggs".into(), "EGGS".into()], 5);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "ingredients:eggs,milk:n:5");
    }

    #[test]
    fn test_ttl_config_per_resource() {
        let ttl = CacheTtlConfig::default();
        assert_eq!(
            ttl.ttl_for_resource(&CacheResource::RecipeDetails { external_id: 1 }),
            Duration::from_secs(TTL_RECIPE_DETAILS_SECS)
        );
        assert_eq!(
            ttl.ttl_for_resource(&CacheResource::random(&[], 3)),
            Duration::from_secs(TTL_RANDOM_RECIPES_SECS)
        );
    }
}
