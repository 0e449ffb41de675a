// ABOUTME: Recipe category model and slug generation
// ABOUTME: Categories are curated by admins and listed publicly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recipe category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    /// Unique identifier
    pub id: Uuid,
    /// Unique display name
    pub name: String,
    /// URL-safe name
    pub slug: String,
    /// Optional description
    pub description: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a category, deriving its slug from the name
    #[must_use]
    pub fn new(name: &str, description: Option<String>) -> Self {
        let name = name.trim().to_owned();
        Self {
            id: Uuid::new_v4(),
            slug: slugify(&name),
            name,
            description,
            created_at: Utc::now(),
        }
    }
}

/// Lower-case ASCII alphanumerics joined by single dashes
#[must_use]
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Quick & Easy Dinners "), "quick-easy-dinners");
        assert_eq!(slugify("Soups"), "soups");
    }
}
