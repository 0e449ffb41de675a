// ABOUTME: Cache factory wrapping the configured cache backend
// ABOUTME: Single entry point used by the recipe cache service and admin routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{memory::InMemoryCache, CacheConfig, CacheKey, CacheProvider, CacheStats};
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Unified cache interface
/// Currently only supports the in-memory backend.
#[derive(Clone)]
pub struct Cache {
    inner: InMemoryCache,
    config: CacheConfig,
}

impl Cache {
    /// Create new cache instance based on configuration
    ///
    /// # Errors
    ///
    /// Returns an error if cache initialization fails
    pub async fn new(config: CacheConfig) -> AppResult<Self> {
        info!(
            "Initializing in-memory cache (max entries: {}, cleanup every {}s)",
            config.max_entries,
            config.cleanup_interval.as_secs()
        );
        let inner = InMemoryCache::new(config.clone()).await?;
        Ok(Self { inner, config })
    }

    /// Configuration the cache was built with
    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// TTL configured for the resource of `key`
    #[must_use]
    pub const fn ttl_for(&self, key: &CacheKey) -> Duration {
        self.config.ttl.ttl_for_resource(&key.resource)
    }

    /// Store value in cache with TTL
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or storage fails
    pub async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    /// Retrieve value from cache
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        self.inner.get(key).await
    }

    /// Remove single cache entry
    ///
    /// # Errors
    ///
    /// Returns an error if invalidation fails
    pub async fn invalidate(&self, key: &CacheKey) -> AppResult<()> {
        self.inner.invalidate(key).await
    }

    /// Remove all cache entries matching pattern
    ///
    /// # Errors
    ///
    /// Returns an error if pattern invalidation fails
    pub async fn invalidate_pattern(&self, pattern: &str) -> AppResult<u64> {
        self.inner.invalidate_pattern(pattern).await
    }

    /// Check if key exists in cache
    ///
    /// # Errors
    ///
    /// Returns an error if existence check fails
    pub async fn exists(&self, key: &CacheKey) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    /// Get remaining TTL for key
    ///
    /// # Errors
    ///
    /// Returns an error if TTL check fails
    pub async fn ttl(&self, key: &CacheKey) -> AppResult<Option<Duration>> {
        self.inner.ttl(key).await
    }

    /// Verify cache backend is healthy
    ///
    /// # Errors
    ///
    /// Returns an error if health check fails
    pub async fn health_check(&self) -> AppResult<()> {
        self.inner.health_check().await
    }

    /// Clear all cache entries
    ///
    /// # Errors
    ///
    /// Returns an error if clear operation fails
    pub async fn clear_all(&self) -> AppResult<()> {
        self.inner.clear_all().await
    }

    /// Counter snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot report stats
    pub async fn stats(&self) -> AppResult<CacheStats> {
        self.inner.stats().await
    }

    /// Sweep expired entries immediately, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        self.inner.purge_expired().await
    }
}
