use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::CreateRecipe;

/// One line of a recipe. `pantry_item_id` is a weak reference: it may be
/// absent or point at a deleted item, in which case the ingredient is not
/// consumable and confirmation simply skips it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    #[serde(default)]
    pub pantry_item_id: Option<Uuid>,
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub servings: Option<i32>,
    pub ingredients: Json<Vec<RecipeIngredient>>,
    pub instructions: Option<String>,
    pub tags: Option<Vec<String>>,
    pub created_at: OffsetDateTime,
}

pub async fn list(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, user_id, title, servings, ingredients, instructions, tags, created_at
        FROM recipes
        WHERE user_id = $1
        ORDER BY title
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, user_id, title, servings, ingredients, instructions, tags, created_at
        FROM recipes
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(recipe)
}

pub async fn create(db: &PgPool, user_id: Uuid, new: &CreateRecipe) -> anyhow::Result<Recipe> {
    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        INSERT INTO recipes (id, user_id, title, servings, ingredients, instructions, tags)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, title, servings, ingredients, instructions, tags, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&new.title)
    .bind(new.servings)
    .bind(Json(&new.ingredients))
    .bind(&new.instructions)
    .bind(&new.tags)
    .fetch_one(db)
    .await?;
    Ok(recipe)
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
