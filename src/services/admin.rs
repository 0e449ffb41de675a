// ABOUTME: Admin dashboard, user management, moderation and contact inbox
// ABOUTME: Every mutating operation is audited through AppLogger
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::recipe_cache::RecipeCacheService;
use crate::auth::{require_admin, AuthResult};
use crate::cache::CacheStats;
use crate::constants::limits::QUOTA_HISTORY_DAYS;
use crate::database::{DailyApiUsage, Database};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::{ContactMessage, User, UserRole};
use crate::rate_limiting::QuotaStatus;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Dashboard counters
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    /// Registered users
    pub users: u64,
    /// Recipes written on the platform
    pub local_recipes: u64,
    /// Recipes mirrored from Spoonacular
    pub mirrored_recipes: u64,
    /// Saved meal plans
    pub meal_plans: u64,
    /// Saved grocery lists
    pub grocery_lists: u64,
    /// Contact messages nobody handled yet
    pub unhandled_contact_messages: u64,
    /// Recipe cache counters
    pub cache: CacheStats,
    /// Share of cache reads that hit
    pub cache_hit_rate: f64,
    /// Today's Spoonacular quota
    pub quota: QuotaStatus,
}

/// One page of users
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    /// Users on this page, newest first
    pub users: Vec<User>,
    /// Total registered users
    pub total: u64,
}

/// Changes an admin may apply to another user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    /// New role
    #[serde(default)]
    pub role: Option<UserRole>,
    /// Activate or deactivate
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Quota status plus recent history
#[derive(Debug, Clone, Serialize)]
pub struct QuotaReport {
    /// Today
    pub status: QuotaStatus,
    /// Points per day, oldest first
    pub history: Vec<DailyApiUsage>,
}

/// Admin operations; every method checks the caller is an admin
#[derive(Clone)]
pub struct AdminService {
    database: Database,
    recipe_cache: Arc<RecipeCacheService>,
}

impl AdminService {
    /// Create the service
    #[must_use]
    pub const fn new(database: Database, recipe_cache: Arc<RecipeCacheService>) -> Self {
        Self {
            database,
            recipe_cache,
        }
    }

    /// Platform counters
    ///
    /// # Errors
    ///
    /// Returns 403 for non-admins or a database error
    pub async fn dashboard_stats(&self, admin: &AuthResult) -> AppResult<DashboardStats> {
        require_admin(admin)?;
        let (local_recipes, mirrored_recipes) = self.database.count_recipes_by_source().await?;
        let cache = self.recipe_cache.cache_stats().await?;

        Ok(DashboardStats {
            users: self.database.count_users().await?,
            local_recipes,
            mirrored_recipes,
            meal_plans: self.database.count_meal_plans().await?,
            grocery_lists: self.database.count_grocery_lists().await?,
            unhandled_contact_messages: self.database.count_unhandled_contact_messages().await?,
            cache_hit_rate: cache.hit_rate(),
            cache,
            quota: self.recipe_cache.quota_status(),
        })
    }

    /// Page through users
    ///
    /// # Errors
    ///
    /// Returns 403 for non-admins or a database error
    pub async fn list_users(&self, admin: &AuthResult, offset: u32, limit: u32) -> AppResult<UserPage> {
        require_admin(admin)?;
        Ok(UserPage {
            users: self.database.list_users(offset, limit).await?,
            total: self.database.count_users().await?,
        })
    }

    /// Change another user's role or active flag
    ///
    /// # Errors
    ///
    /// Returns 403 for non-admins, 400 when targeting oneself, 404 for unknown users
    pub async fn update_user(
        &self,
        admin: &AuthResult,
        user_id: Uuid,
        update: UserUpdate,
    ) -> AppResult<User> {
        require_admin(admin)?;
        if user_id == admin.user_id {
            return Err(AppError::invalid_input(
                "Admins cannot change their own role or status",
            ));
        }

        if let Some(role) = update.role {
            self.database.update_user_role(user_id, role).await?;
            AppLogger::log_admin_action(
                &admin.user_id.to_string(),
                &format!("set_role:{}", role.as_str()),
                &user_id.to_string(),
            );
        }
        if let Some(is_active) = update.is_active {
            self.database.set_user_active(user_id, is_active).await?;
            let action = if is_active { "activate_user" } else { "deactivate_user" };
            AppLogger::log_admin_action(&admin.user_id.to_string(), action, &user_id.to_string());
        }

        self.database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Delete a user together with their recipes, plans and lists
    ///
    /// # Errors
    ///
    /// Returns 403 for non-admins, 400 when targeting oneself, 404 for unknown users
    pub async fn delete_user(&self, admin: &AuthResult, user_id: Uuid) -> AppResult<()> {
        require_admin(admin)?;
        if user_id == admin.user_id {
            return Err(AppError::invalid_input("Admins cannot delete themselves"));
        }
        if !self.database.delete_user(user_id).await? {
            return Err(AppError::not_found("User"));
        }
        AppLogger::log_admin_action(&admin.user_id.to_string(), "delete_user", &user_id.to_string());
        Ok(())
    }

    /// Remove any recipe
    ///
    /// # Errors
    ///
    /// Returns 403 for non-admins and 404 for unknown recipes
    pub async fn delete_recipe(&self, admin: &AuthResult, recipe_id: Uuid) -> AppResult<()> {
        require_admin(admin)?;
        if !self.database.delete_recipe(recipe_id).await? {
            return Err(AppError::not_found("Recipe"));
        }
        AppLogger::log_admin_action(
            &admin.user_id.to_string(),
            "delete_recipe",
            &recipe_id.to_string(),
        );
        Ok(())
    }

    /// Contact messages, newest first
    ///
    /// # Errors
    ///
    /// Returns 403 for non-admins or a database error
    pub async fn list_contact_messages(
        &self,
        admin: &AuthResult,
        unhandled_only: bool,
    ) -> AppResult<Vec<ContactMessage>> {
        require_admin(admin)?;
        self.database.list_contact_messages(unhandled_only).await
    }

    /// Mark a contact message as handled
    ///
    /// # Errors
    ///
    /// Returns 403 for non-admins and 404 for unknown messages
    pub async fn mark_contact_handled(&self, admin: &AuthResult, message_id: Uuid) -> AppResult<()> {
        require_admin(admin)?;
        if !self.database.mark_contact_handled(message_id).await? {
            return Err(AppError::not_found("Contact message"));
        }
        AppLogger::log_admin_action(
            &admin.user_id.to_string(),
            "handle_contact",
            &message_id.to_string(),
        );
        Ok(())
    }

    /// Recipe cache counters
    ///
    /// # Errors
    ///
    /// Returns 403 for non-admins
    pub async fn cache_stats(&self, admin: &AuthResult) -> AppResult<CacheStats> {
        require_admin(admin)?;
        self.recipe_cache.cache_stats().await
    }

    /// Empty the recipe cache
    ///
    /// # Errors
    ///
    /// Returns 403 for non-admins
    pub async fn clear_cache(&self, admin: &AuthResult) -> AppResult<()> {
        require_admin(admin)?;
        self.recipe_cache.clear().await?;
        AppLogger::log_admin_action(&admin.user_id.to_string(), "clear_cache", "recipes");
        Ok(())
    }

    /// Drop cached searches only
    ///
    /// # Errors
    ///
    /// Returns 403 for non-admins
    pub async fn invalidate_search_cache(&self, admin: &AuthResult) -> AppResult<u64> {
        require_admin(admin)?;
        let removed = self.recipe_cache.invalidate_search_cache().await?;
        AppLogger::log_admin_action(&admin.user_id.to_string(), "invalidate_searches", "recipes");
        Ok(removed)
    }

    /// Today's quota and the recent daily history
    ///
    /// # Errors
    ///
    /// Returns 403 for non-admins or a database error
    pub async fn quota_report(&self, admin: &AuthResult) -> AppResult<QuotaReport> {
        require_admin(admin)?;
        let status = self.recipe_cache.quota_status();
        let history = self
            .database
            .api_usage_history(status.day, QUOTA_HISTORY_DAYS)
            .await?;
        Ok(QuotaReport { status, history })
    }
}
