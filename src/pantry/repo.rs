use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreatePantryItem, UpdatePantryItem};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PantryItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub unit: Option<String>,
    /// Size of one container, expressed in `unit`.
    pub quantity: f64,
    /// Number of containers on hand.
    pub count: i64,
    pub low_threshold: Option<f64>,
    pub category: Option<String>,
    pub barcode: Option<String>,
    pub created_at: OffsetDateTime,
    pub last_updated: OffsetDateTime,
}

pub async fn list(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<PantryItem>> {
    let rows = sqlx::query_as::<_, PantryItem>(
        r#"
        SELECT id, user_id, name, unit, quantity, count, low_threshold, category, barcode,
               created_at, last_updated
        FROM pantry_items
        WHERE user_id = $1
        ORDER BY name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Items whose container size has fallen to the reorder point.
pub async fn list_low_stock(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<PantryItem>> {
    let rows = sqlx::query_as::<_, PantryItem>(
        r#"
        SELECT id, user_id, name, unit, quantity, count, low_threshold, category, barcode,
               created_at, last_updated
        FROM pantry_items
        WHERE user_id = $1 AND quantity <= COALESCE(low_threshold, 0)
        ORDER BY name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<PantryItem>> {
    let item = sqlx::query_as::<_, PantryItem>(
        r#"
        SELECT id, user_id, name, unit, quantity, count, low_threshold, category, barcode,
               created_at, last_updated
        FROM pantry_items
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(item)
}

pub async fn find_by_barcode(
    db: &PgPool,
    user_id: Uuid,
    barcode: &str,
) -> anyhow::Result<Option<PantryItem>> {
    let item = sqlx::query_as::<_, PantryItem>(
        r#"
        SELECT id, user_id, name, unit, quantity, count, low_threshold, category, barcode,
               created_at, last_updated
        FROM pantry_items
        WHERE user_id = $1 AND barcode = $2
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(barcode)
    .fetch_optional(db)
    .await?;
    Ok(item)
}

pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    new: &CreatePantryItem,
) -> anyhow::Result<PantryItem> {
    let item = sqlx::query_as::<_, PantryItem>(
        r#"
        INSERT INTO pantry_items (id, user_id, name, unit, quantity, count, low_threshold, category, barcode)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, user_id, name, unit, quantity, count, low_threshold, category, barcode,
                  created_at, last_updated
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&new.name)
    .bind(&new.unit)
    .bind(new.quantity)
    .bind(new.count)
    .bind(new.low_threshold)
    .bind(&new.category)
    .bind(&new.barcode)
    .fetch_one(db)
    .await?;
    Ok(item)
}

/// Partial update: absent fields keep their stored value.
pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    patch: &UpdatePantryItem,
) -> anyhow::Result<Option<PantryItem>> {
    let item = sqlx::query_as::<_, PantryItem>(
        r#"
        UPDATE pantry_items SET
            name = COALESCE($3, name),
            unit = COALESCE($4, unit),
            quantity = COALESCE($5, quantity),
            count = COALESCE($6, count),
            low_threshold = COALESCE($7, low_threshold),
            category = COALESCE($8, category),
            barcode = COALESCE($9, barcode),
            last_updated = now()
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, name, unit, quantity, count, low_threshold, category, barcode,
                  created_at, last_updated
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&patch.name)
    .bind(&patch.unit)
    .bind(patch.quantity)
    .bind(patch.count)
    .bind(patch.low_threshold)
    .bind(&patch.category)
    .bind(&patch.barcode)
    .fetch_optional(db)
    .await?;
    Ok(item)
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM pantry_items WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
