use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::engine::{plan, Plan, ReadSet};
use super::error::ConsumeError;
use super::store::{ConsumeTx, PgConsumeTx};

/// Outcome of a successful confirmation.
#[derive(Debug)]
pub struct Confirmation {
    pub entry_id: Uuid,
    pub confirmed_at: OffsetDateTime,
    pub consumed_items: usize,
    pub flagged_items: usize,
    pub skipped_ingredients: Vec<String>,
}

/// Confirm a scheduled meal: deduct the recipe's ingredients from pantry
/// stock, flag depleted items onto the shopping list, and mark the entry
/// confirmed, all in one atomic unit of work.
pub async fn confirm_meal(
    db: &PgPool,
    user_id: Uuid,
    entry_id: Uuid,
) -> Result<Confirmation, ConsumeError> {
    let tx = PgConsumeTx::begin(db).await?;
    run_confirm(tx, user_id, entry_id, OffsetDateTime::now_utc()).await
}

/// The unit of work itself, generic over the store so tests can run it
/// against the in-memory fake.
///
/// Reading, computing and writing stay strictly separated: every read
/// completes before the first write is staged, which the underlying commit
/// mechanism requires.
pub async fn run_confirm<T: ConsumeTx>(
    mut tx: T,
    user_id: Uuid,
    entry_id: Uuid,
    now: OffsetDateTime,
) -> Result<Confirmation, ConsumeError> {
    // Reading
    let entry = tx
        .calendar_entry(user_id, entry_id)
        .await?
        .ok_or(ConsumeError::EntryNotFound)?;
    if entry.confirmed {
        warn!(%entry_id, "confirmation re-run rejected");
        return Err(ConsumeError::AlreadyConfirmed);
    }
    let recipe = tx
        .recipe(user_id, entry.recipe_id)
        .await?
        .ok_or(ConsumeError::RecipeNotFound)?;

    let ingredients = recipe.ingredients.0.clone();
    let mut items = Vec::with_capacity(ingredients.len());
    for ingredient in ingredients {
        let item = match ingredient.pantry_item_id {
            Some(id) => tx.pantry_item(user_id, id).await?,
            None => None,
        };
        items.push((ingredient, item));
    }
    let read = ReadSet {
        entry,
        recipe,
        items,
    };

    // Computing
    let Plan { writes, skipped } = plan(&read, now)?;
    let consumed_items = writes.pantry.len();
    let flagged_items = writes.shopping.len();

    for upsert in &writes.shopping {
        debug!(item = %upsert.item_name, "pantry item depleted, flagged for shopping list");
    }

    // Writing
    tx.apply(user_id, read.entry.id, &writes).await?;
    tx.commit().await?;

    info!(
        %entry_id,
        recipe = %read.recipe.title,
        consumed = consumed_items,
        flagged = flagged_items,
        skipped = skipped.len(),
        "meal confirmed"
    );

    Ok(Confirmation {
        entry_id,
        confirmed_at: now,
        consumed_items,
        flagged_items,
        skipped_ingredients: skipped,
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::consume::engine::tests::{entry, ingredient, pantry_item, recipe, NOW};
    use crate::consume::store::mem::MemStore;

    use super::*;

    struct Fixture {
        store: MemStore,
        user_id: Uuid,
        entry_id: Uuid,
    }

    /// Seed one entry whose recipe consumes `amount` of a single item.
    fn single_item_fixture(
        item: crate::pantry::repo::PantryItem,
        amount: f64,
        unit: &str,
    ) -> (Fixture, Uuid) {
        let store = MemStore::default();
        let user_id = item.user_id;
        let item_id = item.id;

        let recipe = recipe(
            user_id,
            vec![ingredient(&item.name, Some(item_id), amount, Some(unit))],
        );
        let entry = entry(user_id, recipe.id);
        let entry_id = entry.id;

        {
            let mut data = store.data.lock().unwrap();
            data.pantry.insert(item_id, item);
            data.recipes.insert(recipe.id, recipe);
            data.entries.insert(entry_id, entry);
        }

        (
            Fixture {
                store,
                user_id,
                entry_id,
            },
            item_id,
        )
    }

    #[tokio::test]
    async fn confirms_and_deducts_stock() {
        let mut item = pantry_item("Flour", Some("g"), 500.0, 3);
        let user_id = Uuid::new_v4();
        item.user_id = user_id;
        let (fx, item_id) = single_item_fixture(item, 200.0, "g");

        let confirmation = run_confirm(fx.store.begin(), fx.user_id, fx.entry_id, NOW)
            .await
            .unwrap();
        assert_eq!(confirmation.consumed_items, 1);
        assert_eq!(confirmation.flagged_items, 0);
        assert!(confirmation.skipped_ingredients.is_empty());

        let data = fx.store.data.lock().unwrap();
        let item = &data.pantry[&item_id];
        assert_eq!(item.count, 2);
        assert!((item.quantity - 300.0).abs() < 1e-9);
        let entry = &data.entries[&fx.entry_id];
        assert!(entry.confirmed);
        assert_eq!(entry.confirmed_at, Some(NOW));
    }

    #[tokio::test]
    async fn missing_entry_is_rejected() {
        let store = MemStore::default();
        let err = run_confirm(store.begin(), Uuid::new_v4(), Uuid::new_v4(), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsumeError::EntryNotFound));
    }

    #[tokio::test]
    async fn missing_recipe_aborts_without_any_mutation() {
        let store = MemStore::default();
        let user_id = Uuid::new_v4();

        let mut item = pantry_item("Flour", Some("g"), 500.0, 3);
        item.user_id = user_id;
        let item_id = item.id;
        // Entry points at a recipe that does not exist.
        let entry = entry(user_id, Uuid::new_v4());
        let entry_id = entry.id;

        {
            let mut data = store.data.lock().unwrap();
            data.pantry.insert(item_id, item);
            data.entries.insert(entry_id, entry);
        }

        let err = run_confirm(store.begin(), user_id, entry_id, NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsumeError::RecipeNotFound));

        let data = store.data.lock().unwrap();
        assert_eq!(data.pantry[&item_id].count, 3);
        assert!(!data.entries[&entry_id].confirmed);
        assert!(data.shopping.is_empty());
    }

    #[tokio::test]
    async fn already_confirmed_entry_is_not_consumed_twice() {
        let mut item = pantry_item("Flour", Some("g"), 500.0, 3);
        item.user_id = Uuid::new_v4();
        let (fx, item_id) = single_item_fixture(item, 200.0, "g");

        run_confirm(fx.store.begin(), fx.user_id, fx.entry_id, NOW)
            .await
            .unwrap();
        let err = run_confirm(fx.store.begin(), fx.user_id, fx.entry_id, NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsumeError::AlreadyConfirmed));

        // Stock reflects exactly one confirmation.
        let data = fx.store.data.lock().unwrap();
        assert_eq!(data.pantry[&item_id].count, 2);
        assert!((data.pantry[&item_id].quantity - 300.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unresolved_ingredients_never_block_confirmation() {
        let store = MemStore::default();
        let user_id = Uuid::new_v4();

        let recipe = recipe(
            user_id,
            vec![
                ingredient("Saffron", None, 1.0, Some("g")),
                ingredient("Truffle", Some(Uuid::new_v4()), 5.0, Some("g")),
            ],
        );
        let entry = entry(user_id, recipe.id);
        let entry_id = entry.id;

        {
            let mut data = store.data.lock().unwrap();
            data.recipes.insert(recipe.id, recipe);
            data.entries.insert(entry_id, entry);
        }

        let confirmation = run_confirm(store.begin(), user_id, entry_id, NOW)
            .await
            .unwrap();
        assert_eq!(confirmation.consumed_items, 0);
        assert_eq!(
            confirmation.skipped_ingredients,
            vec!["Saffron", "Truffle"]
        );

        let data = store.data.lock().unwrap();
        assert!(data.entries[&entry_id].confirmed);
        assert!(data.shopping.is_empty());
    }

    #[tokio::test]
    async fn malformed_unit_aborts_without_any_mutation() {
        let mut item = pantry_item("Honey", Some("jar"), 1.0, 2);
        item.user_id = Uuid::new_v4();
        let (fx, item_id) = single_item_fixture(item, 1.0, "tbsp");

        let err = run_confirm(fx.store.begin(), fx.user_id, fx.entry_id, NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsumeError::UnknownUnit(_)));

        let data = fx.store.data.lock().unwrap();
        assert_eq!(data.pantry[&item_id].count, 2);
        assert!(!data.entries[&fx.entry_id].confirmed);
    }

    #[tokio::test]
    async fn depletion_upserts_shopping_list_idempotently() {
        let store = MemStore::default();
        let user_id = Uuid::new_v4();

        let mut item = pantry_item("Olive Oil", Some("g"), 100.0, 1);
        item.user_id = user_id;
        let item_id = item.id;

        let recipe = recipe(
            user_id,
            vec![ingredient("Olive Oil", Some(item_id), 150.0, Some("g"))],
        );
        let first = entry(user_id, recipe.id);
        let second = entry(user_id, recipe.id);
        let (first_id, second_id) = (first.id, second.id);

        {
            let mut data = store.data.lock().unwrap();
            data.pantry.insert(item_id, item);
            data.recipes.insert(recipe.id, recipe);
            data.entries.insert(first_id, first);
            data.entries.insert(second_id, second);
        }

        let confirmation = run_confirm(store.begin(), user_id, first_id, NOW)
            .await
            .unwrap();
        assert_eq!(confirmation.flagged_items, 1);

        // Consuming the same depleted item again refreshes the one row
        // instead of duplicating it.
        run_confirm(store.begin(), user_id, second_id, NOW)
            .await
            .unwrap();

        let data = store.data.lock().unwrap();
        assert_eq!(data.shopping.len(), 1);
        let row = &data.shopping["olive_oil"];
        assert_eq!(row.item_name, "Olive Oil");
        assert!(row.needed);
        // The first run left {count: 0, quantity: -50}; the second consumes
        // from an on-hand total of 0 and records -150.
        assert!((data.pantry[&item_id].quantity - -150.0).abs() < 1e-9);
        assert_eq!(data.pantry[&item_id].count, 0);
    }

    #[tokio::test]
    async fn concurrent_confirmations_of_one_item_conflict_then_retry() {
        let store = MemStore::default();
        let user_id = Uuid::new_v4();

        let mut item = pantry_item("Flour", Some("g"), 500.0, 4);
        item.user_id = user_id;
        let item_id = item.id;

        let recipe = recipe(
            user_id,
            vec![ingredient("Flour", Some(item_id), 200.0, Some("g"))],
        );
        let first = entry(user_id, recipe.id);
        let second = entry(user_id, recipe.id);
        let (first_id, second_id) = (first.id, second.id);

        {
            let mut data = store.data.lock().unwrap();
            data.pantry.insert(item_id, item);
            data.recipes.insert(recipe.id, recipe);
            data.entries.insert(first_id, first);
            data.entries.insert(second_id, second);
        }

        // Both units of work begin before either commits.
        let tx1 = store.begin();
        let tx2 = store.begin();

        run_confirm(tx1, user_id, first_id, NOW).await.unwrap();
        let err = run_confirm(tx2, user_id, second_id, NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsumeError::Conflict));

        // The loser retries from a fresh snapshot and succeeds.
        run_confirm(store.begin(), user_id, second_id, NOW)
            .await
            .unwrap();

        // Both deductions applied serially. The first leaves
        // {count: 3, quantity: 300}; the second consumes 200 g from the
        // re-derived total of 900 g, giving {count: 2, quantity: 100}.
        let data = store.data.lock().unwrap();
        assert_eq!(data.pantry[&item_id].count, 2);
        assert!((data.pantry[&item_id].quantity - 100.0).abs() < 1e-9);
        assert!(data.entries[&first_id].confirmed);
        assert!(data.entries[&second_id].confirmed);
    }

    #[tokio::test]
    async fn disjoint_confirmations_commit_independently() {
        let store = MemStore::default();
        let user_id = Uuid::new_v4();

        let mut flour = pantry_item("Flour", Some("g"), 500.0, 3);
        flour.user_id = user_id;
        let mut milk = pantry_item("Milk", Some("L"), 1.0, 2);
        milk.user_id = user_id;
        let (flour_id, milk_id) = (flour.id, milk.id);

        let flour_recipe = recipe(
            user_id,
            vec![ingredient("Flour", Some(flour_id), 200.0, Some("g"))],
        );
        let milk_recipe = recipe(
            user_id,
            vec![ingredient("Milk", Some(milk_id), 250.0, Some("mL"))],
        );
        let first = entry(user_id, flour_recipe.id);
        let second = entry(user_id, milk_recipe.id);
        let (first_id, second_id) = (first.id, second.id);

        {
            let mut data = store.data.lock().unwrap();
            data.pantry.insert(flour_id, flour);
            data.pantry.insert(milk_id, milk);
            data.recipes.insert(flour_recipe.id, flour_recipe);
            data.recipes.insert(milk_recipe.id, milk_recipe);
            data.entries.insert(first_id, first);
            data.entries.insert(second_id, second);
        }

        let tx1 = store.begin();
        let tx2 = store.begin();

        run_confirm(tx1, user_id, first_id, NOW).await.unwrap();
        run_confirm(tx2, user_id, second_id, NOW).await.unwrap();

        let data = store.data.lock().unwrap();
        assert!(data.entries[&first_id].confirmed);
        assert!(data.entries[&second_id].confirmed);
        assert_eq!(data.pantry[&flour_id].count, 2);
        assert_eq!(data.pantry[&milk_id].count, 1);
    }

    #[tokio::test]
    async fn entries_are_invisible_across_users() {
        let mut item = pantry_item("Flour", Some("g"), 500.0, 3);
        item.user_id = Uuid::new_v4();
        let (fx, _) = single_item_fixture(item, 200.0, "g");

        let stranger = Uuid::new_v4();
        let err = run_confirm(fx.store.begin(), stranger, fx.entry_id, NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsumeError::EntryNotFound));
    }
}
