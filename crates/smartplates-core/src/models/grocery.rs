// ABOUTME: Grocery list model with checkable line items
// ABOUTME: Lists are either hand-written or generated from a meal plan
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shopping list line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroceryItem {
    /// Item name
    pub name: String,
    /// Quantity
    #[serde(default)]
    pub amount: f64,
    /// Unit, empty for countable items
    #[serde(default)]
    pub unit: String,
    /// Store section ("Produce", "Dairy", ...)
    #[serde(default)]
    pub category: String,
    /// Already in the basket
    #[serde(default)]
    pub checked: bool,
}

/// Saved grocery list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroceryList {
    /// Unique identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// List name
    pub name: String,
    /// Plan the list was generated from
    pub meal_plan_id: Option<Uuid>,
    /// Items
    pub items: Vec<GroceryItem>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl GroceryList {
    /// Create a new list
    #[must_use]
    pub fn new(
        user_id: Uuid,
        name: String,
        meal_plan_id: Option<Uuid>,
        items: Vec<GroceryItem>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            meal_plan_id,
            items,
            created_at: now,
            updated_at: now,
        }
    }
}
