use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One shopping-list row. The slug doubles as the document key, so repeated
/// upserts for the same item land on one row instead of duplicating it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShoppingListEntry {
    pub user_id: Uuid,
    pub slug: String,
    pub item_name: String,
    pub unit: String,
    pub quantity: f64,
    pub needed: bool,
    pub updated_at: OffsetDateTime,
}

/// Normalized, lowercase, whitespace-collapsed key derived from an item name.
pub fn slugify(name: &str) -> String {
    lazy_static! {
        static ref WS_RE: Regex = Regex::new(r"\s+").unwrap();
    }
    WS_RE.replace_all(name.trim(), "_").to_lowercase()
}

pub async fn list(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<ShoppingListEntry>> {
    let rows = sqlx::query_as::<_, ShoppingListEntry>(
        r#"
        SELECT user_id, slug, item_name, unit, quantity, needed, updated_at
        FROM shopping_list
        WHERE user_id = $1
        ORDER BY item_name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Merge-upsert keyed by the item-name slug.
pub async fn upsert(
    db: &PgPool,
    user_id: Uuid,
    item_name: &str,
    unit: &str,
    quantity: f64,
    needed: bool,
) -> anyhow::Result<ShoppingListEntry> {
    let entry = sqlx::query_as::<_, ShoppingListEntry>(
        r#"
        INSERT INTO shopping_list (user_id, slug, item_name, unit, quantity, needed, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, now())
        ON CONFLICT (user_id, slug) DO UPDATE SET
            item_name = EXCLUDED.item_name,
            unit = EXCLUDED.unit,
            quantity = EXCLUDED.quantity,
            needed = EXCLUDED.needed,
            updated_at = now()
        RETURNING user_id, slug, item_name, unit, quantity, needed, updated_at
        "#,
    )
    .bind(user_id)
    .bind(slugify(item_name))
    .bind(item_name)
    .bind(unit)
    .bind(quantity)
    .bind(needed)
    .fetch_one(db)
    .await?;
    Ok(entry)
}

pub async fn set_needed(
    db: &PgPool,
    user_id: Uuid,
    slug: &str,
    needed: bool,
) -> anyhow::Result<Option<ShoppingListEntry>> {
    let entry = sqlx::query_as::<_, ShoppingListEntry>(
        r#"
        UPDATE shopping_list
        SET needed = $3, updated_at = now()
        WHERE user_id = $1 AND slug = $2
        RETURNING user_id, slug, item_name, unit, quantity, needed, updated_at
        "#,
    )
    .bind(user_id)
    .bind(slug)
    .bind(needed)
    .fetch_optional(db)
    .await?;
    Ok(entry)
}

#[cfg(test)]
mod slug_tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_lowercases() {
        assert_eq!(slugify("Olive Oil"), "olive_oil");
        assert_eq!(slugify("Olive   Oil"), "olive_oil");
        assert_eq!(slugify("  Baking\tSoda "), "baking_soda");
    }

    #[test]
    fn stable_for_already_normalized_names() {
        assert_eq!(slugify("flour"), "flour");
        assert_eq!(slugify(slugify("Brown Sugar").as_str()), "brown_sugar");
    }
}
