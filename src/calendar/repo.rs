use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "meal_type", rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

/// A scheduled meal. `confirmed` flips to true exactly once, through the
/// consumption engine; a confirmed entry is a historical fact and can no
/// longer be deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CalendarEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: Date,
    pub meal: MealType,
    pub recipe_id: Uuid,
    pub confirmed: bool,
    pub confirmed_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

pub enum DeleteOutcome {
    Deleted,
    Confirmed,
    NotFound,
}

/// Entries for one day, in meal order (the `meal_type` enum declares
/// breakfast, lunch, dinner in serving order).
pub async fn list_for_date(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
) -> anyhow::Result<Vec<CalendarEntry>> {
    let rows = sqlx::query_as::<_, CalendarEntry>(
        r#"
        SELECT id, user_id, date, meal, recipe_id, confirmed, confirmed_at, created_at
        FROM calendar_entries
        WHERE user_id = $1 AND date = $2
        ORDER BY meal
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<CalendarEntry>> {
    let entry = sqlx::query_as::<_, CalendarEntry>(
        r#"
        SELECT id, user_id, date, meal, recipe_id, confirmed, confirmed_at, created_at
        FROM calendar_entries
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(entry)
}

/// Schedule a meal. New entries always start unconfirmed.
pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
    meal: MealType,
    recipe_id: Uuid,
) -> anyhow::Result<CalendarEntry> {
    let entry = sqlx::query_as::<_, CalendarEntry>(
        r#"
        INSERT INTO calendar_entries (id, user_id, date, meal, recipe_id, confirmed)
        VALUES ($1, $2, $3, $4, $5, FALSE)
        RETURNING id, user_id, date, meal, recipe_id, confirmed, confirmed_at, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(date)
    .bind(meal)
    .bind(recipe_id)
    .fetch_one(db)
    .await?;
    Ok(entry)
}

/// Delete an entry, refusing once it has been confirmed.
pub async fn delete_unconfirmed(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> anyhow::Result<DeleteOutcome> {
    let result =
        sqlx::query("DELETE FROM calendar_entries WHERE id = $1 AND user_id = $2 AND NOT confirmed")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
    if result.rows_affected() > 0 {
        return Ok(DeleteOutcome::Deleted);
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM calendar_entries WHERE id = $1 AND user_id = $2)",
    )
    .bind(id)
    .bind(user_id)
    .fetch_one(db)
    .await?;
    if exists {
        Ok(DeleteOutcome::Confirmed)
    } else {
        Ok(DeleteOutcome::NotFound)
    }
}

#[cfg(test)]
mod meal_type_tests {
    use super::*;

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MealType::Breakfast).unwrap(), "\"breakfast\"");
        assert_eq!(serde_json::to_string(&MealType::Dinner).unwrap(), "\"dinner\"");
    }

    #[test]
    fn deserializes_lowercase() {
        let meal: MealType = serde_json::from_str("\"lunch\"").unwrap();
        assert_eq!(meal, MealType::Lunch);
    }
}
