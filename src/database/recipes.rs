// ABOUTME: Recipe database operations for local and mirrored Spoonacular recipes
// ABOUTME: CRUD, filtered search, external-id upsert, ratings and saved recipes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{from_json, parse_uuid, to_json, to_u32, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Recipe, RecipeSource};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

/// Filters applied to stored recipes, authored and mirrored alike, during search
#[derive(Debug, Clone, Default)]
pub struct LocalRecipeFilter {
    /// Substring of title or summary
    pub text: Option<String>,
    /// Cuisine contained in the recipe's cuisines
    pub cuisine: Option<String>,
    /// Diet contained in the recipe's diets
    pub diet: Option<String>,
    /// Upper bound on total time
    pub max_ready_time: Option<u32>,
}

impl LocalRecipeFilter {
    fn push_conditions(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        let mut keyword = " WHERE ";
        if let Some(text) = self.text.as_deref().filter(|t| !t.trim().is_empty()) {
            let pattern = format!("%{}%", escape_like(text.trim()));
            builder
                .push(keyword)
                .push("(title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR summary LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
            keyword = " AND ";
        }
        // JSON arrays are stored as text, so match the quoted element
        if let Some(cuisine) = self.cuisine.as_deref().filter(|c| !c.trim().is_empty()) {
            builder
                .push(keyword)
                .push("cuisines LIKE ")
                .push_bind(format!("%\"{}\"%", escape_like(cuisine.trim())))
                .push(" ESCAPE '\\'");
            keyword = " AND ";
        }
        if let Some(diet) = self.diet.as_deref().filter(|d| !d.trim().is_empty()) {
            builder
                .push(keyword)
                .push("diets LIKE ")
                .push_bind(format!("%\"{}\"%", escape_like(diet.trim())))
                .push(" ESCAPE '\\'");
            keyword = " AND ";
        }
        if let Some(max) = self.max_ready_time {
            builder
                .push(keyword)
                .push("ready_in_minutes IS NOT NULL AND ready_in_minutes <= ")
                .push_bind(i64::from(max));
        }
    }
}

/// Escape `LIKE` wildcards so user text matches literally under `ESCAPE '\'`
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Database {
    /// Create recipe, rating and saved-recipe tables
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_recipes(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS recipes (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                summary TEXT,
                image_url TEXT,
                ready_in_minutes INTEGER,
                servings INTEGER NOT NULL DEFAULT 1,
                cuisines TEXT NOT NULL DEFAULT '[]',
                dish_types TEXT NOT NULL DEFAULT '[]',
                diets TEXT NOT NULL DEFAULT '[]',
                ingredients TEXT NOT NULL DEFAULT '[]',
                instructions TEXT NOT NULL DEFAULT '[]',
                nutrition TEXT,
                source TEXT NOT NULL CHECK (source IN ('local', 'spoonacular')),
                author_id TEXT REFERENCES users(id) ON DELETE CASCADE,
                external_id INTEGER UNIQUE,
                average_rating REAL NOT NULL DEFAULT 0,
                rating_count INTEGER NOT NULL DEFAULT 0,
                view_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS recipe_ratings (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                recipe_id TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, recipe_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS saved_recipes (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                recipe_id TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                saved_at TEXT NOT NULL,
                PRIMARY KEY (user_id, recipe_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_recipes_author ON recipes(author_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_recipes_source ON recipes(source)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_recipe_ratings_recipe ON recipe_ratings(recipe_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a recipe document
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the insert fails
    pub async fn create_recipe(&self, recipe: &Recipe) -> AppResult<Uuid> {
        let (source, author_id, external_id) = source_columns(&recipe.source);
        sqlx::query(
            r"
            INSERT INTO recipes (id, title, summary, image_url, ready_in_minutes, servings,
                                 cuisines, dish_types, diets, ingredients, instructions, nutrition,
                                 source, author_id, external_id, average_rating, rating_count,
                                 view_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20)
            ",
        )
        .bind(recipe.id.to_string())
        .bind(&recipe.title)
        .bind(&recipe.summary)
        .bind(&recipe.image_url)
        .bind(recipe.ready_in_minutes.map(i64::from))
        .bind(i64::from(recipe.servings))
        .bind(to_json(&recipe.cuisines)?)
        .bind(to_json(&recipe.dish_types)?)
        .bind(to_json(&recipe.diets)?)
        .bind(to_json(&recipe.ingredients)?)
        .bind(to_json(&recipe.instructions)?)
        .bind(recipe.nutrition.as_ref().map(to_json).transpose()?)
        .bind(source)
        .bind(author_id)
        .bind(external_id)
        .bind(recipe.average_rating)
        .bind(i64::from(recipe.rating_count))
        .bind(i64::try_from(recipe.view_count).unwrap_or(i64::MAX))
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(recipe.id)
    }

    /// Overwrite the editable fields of a recipe
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the recipe does not exist
    pub async fn update_recipe(&self, recipe: &Recipe) -> AppResult<()> {
        let result = sqlx::query(
            r"
            UPDATE recipes SET title = $1, summary = $2, image_url = $3, ready_in_minutes = $4,
                               servings = $5, cuisines = $6, dish_types = $7, diets = $8,
                               ingredients = $9, instructions = $10, nutrition = $11,
                               updated_at = $12
            WHERE id = $13
            ",
        )
        .bind(&recipe.title)
        .bind(&recipe.summary)
        .bind(&recipe.image_url)
        .bind(recipe.ready_in_minutes.map(i64::from))
        .bind(i64::from(recipe.servings))
        .bind(to_json(&recipe.cuisines)?)
        .bind(to_json(&recipe.dish_types)?)
        .bind(to_json(&recipe.diets)?)
        .bind(to_json(&recipe.ingredients)?)
        .bind(to_json(&recipe.instructions)?)
        .bind(recipe.nutrition.as_ref().map(to_json).transpose()?)
        .bind(recipe.updated_at)
        .bind(recipe.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Recipe {}", recipe.id)));
        }
        Ok(())
    }

    /// Insert or refresh a mirrored Spoonacular recipe, keyed by external id
    ///
    /// Returns the stored row, whose id is stable across refreshes.
    ///
    /// # Errors
    ///
    /// Returns an error if the recipe is not a Spoonacular recipe or the
    /// upsert fails
    pub async fn upsert_external_recipe(&self, recipe: &Recipe) -> AppResult<Recipe> {
        let Some(external_id) = recipe.external_id() else {
            return Err(AppError::invalid_input(
                "Only Spoonacular recipes can be mirrored",
            ));
        };

        sqlx::query(
            r"
            INSERT INTO recipes (id, title, summary, image_url, ready_in_minutes, servings,
                                 cuisines, dish_types, diets, ingredients, instructions, nutrition,
                                 source, author_id, external_id, average_rating, rating_count,
                                 view_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'spoonacular', NULL, $13,
                    0, 0, 0, $14, $14)
            ON CONFLICT(external_id) DO UPDATE SET
                title = excluded.title,
                summary = excluded.summary,
                image_url = excluded.image_url,
                ready_in_minutes = excluded.ready_in_minutes,
                servings = excluded.servings,
                cuisines = excluded.cuisines,
                dish_types = excluded.dish_types,
                diets = excluded.diets,
                ingredients = excluded.ingredients,
                instructions = excluded.instructions,
                nutrition = excluded.nutrition,
                updated_at = excluded.updated_at
            ",
        )
        .bind(recipe.id.to_string())
        .bind(&recipe.title)
        .bind(&recipe.summary)
        .bind(&recipe.image_url)
        .bind(recipe.ready_in_minutes.map(i64::from))
        .bind(i64::from(recipe.servings))
        .bind(to_json(&recipe.cuisines)?)
        .bind(to_json(&recipe.dish_types)?)
        .bind(to_json(&recipe.diets)?)
        .bind(to_json(&recipe.ingredients)?)
        .bind(to_json(&recipe.instructions)?)
        .bind(recipe.nutrition.as_ref().map(to_json).transpose()?)
        .bind(external_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_recipe_by_external_id(external_id)
            .await?
            .ok_or_else(|| AppError::database(format!("Mirrored recipe {external_id} vanished")))
    }

    /// Get a recipe by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt
    pub async fn get_recipe(&self, recipe_id: Uuid) -> AppResult<Option<Recipe>> {
        let row = sqlx::query("SELECT * FROM recipes WHERE id = $1")
            .bind(recipe_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_recipe).transpose()
    }

    /// Get a mirrored recipe by its Spoonacular id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt
    pub async fn get_recipe_by_external_id(&self, external_id: i64) -> AppResult<Option<Recipe>> {
        let row = sqlx::query("SELECT * FROM recipes WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_recipe).transpose()
    }

    /// Fetch several recipes at once, in no particular order
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt
    pub async fn get_recipes_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Recipe>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM recipes WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_recipe).collect()
    }

    /// Delete a recipe
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_recipe(&self, recipe_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count one detail view
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn increment_view_count(&self, recipe_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE recipes SET view_count = view_count + 1 WHERE id = $1")
            .bind(recipe_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Search local recipes, newest first, returning the page and total matches
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt
    pub async fn search_local_recipes(
        &self,
        filter: &LocalRecipeFilter,
        offset: u32,
        limit: u32,
    ) -> AppResult<(Vec<Recipe>, u32)> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM recipes");
        filter.push_conditions(&mut count_query);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut page_query = QueryBuilder::<Sqlite>::new("SELECT * FROM recipes");
        filter.push_conditions(&mut page_query);
        page_query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::from(offset));
        let rows = page_query.build().fetch_all(&self.pool).await?;

        let recipes = rows.iter().map(row_to_recipe).collect::<AppResult<Vec<_>>>()?;
        Ok((recipes, to_u32(total)))
    }

    /// Recipes written by one author, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt
    pub async fn list_recipes_by_author(&self, author_id: Uuid) -> AppResult<Vec<Recipe>> {
        let rows =
            sqlx::query("SELECT * FROM recipes WHERE author_id = $1 ORDER BY created_at DESC")
                .bind(author_id.to_string())
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(row_to_recipe).collect()
    }

    /// Ids of recipes written by one author
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn authored_recipe_ids(&self, author_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM recipes WHERE author_id = $1 ORDER BY created_at")
                .bind(author_id.to_string())
                .fetch_all(&self.pool)
                .await?;
        ids.iter().map(|id| parse_uuid(id)).collect()
    }

    /// Top local recipes by rating, then rating count, then views
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt
    pub async fn popular_recipes(&self, limit: u32) -> AppResult<Vec<Recipe>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM recipes WHERE source = 'local'
            ORDER BY average_rating DESC, rating_count DESC, view_count DESC, created_at DESC
            LIMIT $1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_recipe).collect()
    }

    /// Number of (local, mirrored) recipes
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_recipes_by_source(&self) -> AppResult<(u64, u64)> {
        let row = sqlx::query(
            r"
            SELECT
                COALESCE(SUM(CASE WHEN source = 'local' THEN 1 ELSE 0 END), 0) AS local_count,
                COALESCE(SUM(CASE WHEN source = 'spoonacular' THEN 1 ELSE 0 END), 0) AS mirrored_count
            FROM recipes
            ",
        )
        .fetch_one(&self.pool)
        .await?;
        let local: i64 = row.try_get("local_count")?;
        let mirrored: i64 = row.try_get("mirrored_count")?;
        Ok((
            u64::try_from(local).unwrap_or(0),
            u64::try_from(mirrored).unwrap_or(0),
        ))
    }

    /// Record a user's rating and recompute the recipe's aggregate
    ///
    /// Returns the new `(average_rating, rating_count)`.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement in the transaction fails
    pub async fn upsert_rating(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        rating: u8,
    ) -> AppResult<(f64, u32)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO recipe_ratings (user_id, recipe_id, rating, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT(user_id, recipe_id) DO UPDATE SET
                rating = excluded.rating,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id.to_string())
        .bind(recipe_id.to_string())
        .bind(i64::from(rating))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE recipes SET
                average_rating = (SELECT COALESCE(AVG(rating), 0) FROM recipe_ratings WHERE recipe_id = $1),
                rating_count = (SELECT COUNT(*) FROM recipe_ratings WHERE recipe_id = $1)
            WHERE id = $1
            ",
        )
        .bind(recipe_id.to_string())
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query("SELECT average_rating, rating_count FROM recipes WHERE id = $1")
            .bind(recipe_id.to_string())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        let average: f64 = row.try_get("average_rating")?;
        let count: i64 = row.try_get("rating_count")?;
        Ok((average, to_u32(count)))
    }

    /// A user's rating of a recipe, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_user_rating(&self, user_id: Uuid, recipe_id: Uuid) -> AppResult<Option<u8>> {
        let rating: Option<i64> = sqlx::query_scalar(
            "SELECT rating FROM recipe_ratings WHERE user_id = $1 AND recipe_id = $2",
        )
        .bind(user_id.to_string())
        .bind(recipe_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(rating.and_then(|r| u8::try_from(r).ok()))
    }

    /// Bookmark a recipe; saving twice is a no-op
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn save_recipe(&self, user_id: Uuid, recipe_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO saved_recipes (user_id, recipe_id, saved_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id.to_string())
        .bind(recipe_id.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove a bookmark, returning whether one existed
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn unsave_recipe(&self, user_id: Uuid, recipe_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM saved_recipes WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id.to_string())
            .bind(recipe_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Ids of a user's bookmarked recipes, most recent first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn saved_recipe_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT recipe_id FROM saved_recipes WHERE user_id = $1 ORDER BY saved_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        ids.iter().map(|id| parse_uuid(id)).collect()
    }

    /// A user's bookmarked recipes, most recent first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt
    pub async fn saved_recipes(&self, user_id: Uuid) -> AppResult<Vec<Recipe>> {
        let rows = sqlx::query(
            r"
            SELECT r.* FROM recipes r
            JOIN saved_recipes s ON s.recipe_id = r.id
            WHERE s.user_id = $1
            ORDER BY s.saved_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_recipe).collect()
    }
}

fn source_columns(source: &RecipeSource) -> (&'static str, Option<String>, Option<i64>) {
    match source {
        RecipeSource::Local { author_id } => ("local", Some(author_id.to_string()), None),
        RecipeSource::Spoonacular { external_id } => ("spoonacular", None, Some(*external_id)),
    }
}

fn row_to_recipe(row: &SqliteRow) -> AppResult<Recipe> {
    let id: String = row.try_get("id")?;
    let source_kind: String = row.try_get("source")?;
    let source = match source_kind.as_str() {
        "local" => {
            let author: Option<String> = row.try_get("author_id")?;
            let author = author
                .ok_or_else(|| AppError::database(format!("Local recipe {id} has no author")))?;
            RecipeSource::Local {
                author_id: parse_uuid(&author)?,
            }
        }
        "spoonacular" => {
            let external: Option<i64> = row.try_get("external_id")?;
            RecipeSource::Spoonacular {
                external_id: external.ok_or_else(|| {
                    AppError::database(format!("Mirrored recipe {id} has no external id"))
                })?,
            }
        }
        other => {
            return Err(AppError::database(format!(
                "Unknown recipe source '{other}'"
            )))
        }
    };

    let cuisines: String = row.try_get("cuisines")?;
    let dish_types: String = row.try_get("dish_types")?;
    let diets: String = row.try_get("diets")?;
    let ingredients: String = row.try_get("ingredients")?;
    let instructions: String = row.try_get("instructions")?;
    let nutrition: Option<String> = row.try_get("nutrition")?;
    let ready: Option<i64> = row.try_get("ready_in_minutes")?;
    let servings: i64 = row.try_get("servings")?;
    let rating_count: i64 = row.try_get("rating_count")?;
    let view_count: i64 = row.try_get("view_count")?;

    Ok(Recipe {
        id: parse_uuid(&id)?,
        title: row.try_get("title")?,
        summary: row.try_get("summary")?,
        image_url: row.try_get("image_url")?,
        ready_in_minutes: ready.map(to_u32),
        servings: to_u32(servings),
        cuisines: from_json(&cuisines)?,
        dish_types: from_json(&dish_types)?,
        diets: from_json(&diets)?,
        ingredients: from_json(&ingredients)?,
        instructions: from_json(&instructions)?,
        nutrition: nutrition.as_deref().map(from_json).transpose()?,
        source,
        average_rating: row.try_get("average_rating")?,
        rating_count: to_u32(rating_count),
        view_count: u64::try_from(view_count).unwrap_or(0),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
