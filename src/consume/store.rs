use axum::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::calendar::repo::CalendarEntry;
use crate::pantry::repo::PantryItem;
use crate::recipes::repo::Recipe;

use super::engine::WriteSet;
use super::error::StoreError;

/// Read/write contract of one atomic unit of work.
///
/// All reads happen before `apply`; the commit makes the combined effect
/// visible at once or not at all. Concurrent modification of anything in
/// the read set surfaces as `StoreError::Conflict` no later than commit
/// time. Documents must not be re-read after a write.
#[async_trait]
pub trait ConsumeTx: Send {
    async fn calendar_entry(
        &mut self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<CalendarEntry>, StoreError>;

    async fn recipe(&mut self, user_id: Uuid, id: Uuid) -> Result<Option<Recipe>, StoreError>;

    async fn pantry_item(
        &mut self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PantryItem>, StoreError>;

    /// Stage every pantry mutation and shopping-list upsert, then mark the
    /// entry confirmed.
    async fn apply(
        &mut self,
        user_id: Uuid,
        entry_id: Uuid,
        writes: &WriteSet,
    ) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}

/// The production unit of work: a Postgres transaction at SERIALIZABLE
/// isolation, so a stale read set fails the commit instead of silently
/// double-consuming.
pub struct PgConsumeTx {
    tx: Transaction<'static, Postgres>,
}

impl PgConsumeTx {
    pub async fn begin(pool: &PgPool) -> Result<Self, StoreError> {
        let mut tx = pool.begin().await.map_err(map_sqlx)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        Ok(Self { tx })
    }
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        // 40001 serialization_failure, 40P01 deadlock_detected
        if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) {
            return StoreError::Conflict;
        }
    }
    StoreError::Other(e.into())
}

#[async_trait]
impl ConsumeTx for PgConsumeTx {
    async fn calendar_entry(
        &mut self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<CalendarEntry>, StoreError> {
        sqlx::query_as::<_, CalendarEntry>(
            r#"
            SELECT id, user_id, date, meal, recipe_id, confirmed, confirmed_at, created_at
            FROM calendar_entries
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)
    }

    async fn recipe(&mut self, user_id: Uuid, id: Uuid) -> Result<Option<Recipe>, StoreError> {
        sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, user_id, title, servings, ingredients, instructions, tags, created_at
            FROM recipes
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)
    }

    async fn pantry_item(
        &mut self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PantryItem>, StoreError> {
        sqlx::query_as::<_, PantryItem>(
            r#"
            SELECT id, user_id, name, unit, quantity, count, low_threshold, category, barcode,
                   created_at, last_updated
            FROM pantry_items
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)
    }

    async fn apply(
        &mut self,
        user_id: Uuid,
        entry_id: Uuid,
        writes: &WriteSet,
    ) -> Result<(), StoreError> {
        for update in &writes.pantry {
            sqlx::query(
                r#"
                UPDATE pantry_items
                SET count = $3, quantity = $4, last_updated = $5
                WHERE id = $1 AND user_id = $2
                "#,
            )
            .bind(update.id)
            .bind(user_id)
            .bind(update.count)
            .bind(update.quantity)
            .bind(update.last_updated)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        }

        for upsert in &writes.shopping {
            sqlx::query(
                r#"
                INSERT INTO shopping_list (user_id, slug, item_name, unit, quantity, needed, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (user_id, slug) DO UPDATE SET
                    item_name = EXCLUDED.item_name,
                    unit = EXCLUDED.unit,
                    quantity = EXCLUDED.quantity,
                    needed = EXCLUDED.needed,
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(user_id)
            .bind(&upsert.slug)
            .bind(&upsert.item_name)
            .bind(&upsert.unit)
            .bind(upsert.quantity)
            .bind(upsert.needed)
            .bind(upsert.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        }

        sqlx::query(
            r#"
            UPDATE calendar_entries
            SET confirmed = TRUE, confirmed_at = $3
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .bind(writes.confirmed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_sqlx)
    }
}

#[cfg(test)]
pub(crate) mod mem {
    //! In-memory stand-in for the Postgres unit of work: snapshot reads,
    //! buffered writes, and a per-document version check at commit, mirroring
    //! the optimistic-concurrency contract the engine relies on.

    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::async_trait;
    use uuid::Uuid;

    use crate::calendar::repo::CalendarEntry;
    use crate::pantry::repo::PantryItem;
    use crate::recipes::repo::Recipe;
    use crate::shopping::repo::ShoppingListEntry;

    use super::super::engine::WriteSet;
    use super::super::error::StoreError;
    use super::ConsumeTx;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum DocKey {
        Entry(Uuid),
        Recipe(Uuid),
        Pantry(Uuid),
        Shopping(String),
    }

    #[derive(Default)]
    pub struct MemData {
        pub entries: HashMap<Uuid, CalendarEntry>,
        pub recipes: HashMap<Uuid, Recipe>,
        pub pantry: HashMap<Uuid, PantryItem>,
        pub shopping: HashMap<String, ShoppingListEntry>,
        versions: HashMap<DocKey, u64>,
    }

    #[derive(Clone, Default)]
    pub struct MemStore {
        pub data: Arc<Mutex<MemData>>,
    }

    impl MemStore {
        pub fn begin(&self) -> MemTx {
            let data = self.data.lock().unwrap();
            MemTx {
                store: self.clone(),
                entries: data.entries.clone(),
                recipes: data.recipes.clone(),
                pantry: data.pantry.clone(),
                versions_at_begin: data.versions.clone(),
                read_versions: HashMap::new(),
                pending: None,
            }
        }
    }

    pub struct MemTx {
        store: MemStore,
        entries: HashMap<Uuid, CalendarEntry>,
        recipes: HashMap<Uuid, Recipe>,
        pantry: HashMap<Uuid, PantryItem>,
        versions_at_begin: HashMap<DocKey, u64>,
        read_versions: HashMap<DocKey, u64>,
        pending: Option<(Uuid, Uuid, WriteSet)>,
    }

    impl MemTx {
        fn note_read(&mut self, key: DocKey) {
            let version = self.versions_at_begin.get(&key).copied().unwrap_or(0);
            self.read_versions.insert(key, version);
        }
    }

    #[async_trait]
    impl ConsumeTx for MemTx {
        async fn calendar_entry(
            &mut self,
            user_id: Uuid,
            id: Uuid,
        ) -> Result<Option<CalendarEntry>, StoreError> {
            self.note_read(DocKey::Entry(id));
            Ok(self
                .entries
                .get(&id)
                .filter(|e| e.user_id == user_id)
                .cloned())
        }

        async fn recipe(&mut self, user_id: Uuid, id: Uuid) -> Result<Option<Recipe>, StoreError> {
            self.note_read(DocKey::Recipe(id));
            Ok(self
                .recipes
                .get(&id)
                .filter(|r| r.user_id == user_id)
                .cloned())
        }

        async fn pantry_item(
            &mut self,
            user_id: Uuid,
            id: Uuid,
        ) -> Result<Option<PantryItem>, StoreError> {
            self.note_read(DocKey::Pantry(id));
            Ok(self
                .pantry
                .get(&id)
                .filter(|p| p.user_id == user_id)
                .cloned())
        }

        async fn apply(
            &mut self,
            user_id: Uuid,
            entry_id: Uuid,
            writes: &WriteSet,
        ) -> Result<(), StoreError> {
            self.pending = Some((user_id, entry_id, writes.clone()));
            Ok(())
        }

        async fn commit(self) -> Result<(), StoreError> {
            let MemTx {
                store,
                read_versions,
                pending,
                ..
            } = self;
            let mut data = store.data.lock().unwrap();

            // Compare-and-set: every document in the read set must still
            // carry the version it had when this unit of work began.
            for (key, version) in &read_versions {
                let current = data.versions.get(key).copied().unwrap_or(0);
                if current != *version {
                    return Err(StoreError::Conflict);
                }
            }

            let Some((user_id, entry_id, writes)) = pending else {
                return Ok(());
            };

            for update in &writes.pantry {
                if let Some(item) = data.pantry.get_mut(&update.id) {
                    if item.user_id == user_id {
                        item.count = update.count;
                        item.quantity = update.quantity;
                        item.last_updated = update.last_updated;
                    }
                }
                *data.versions.entry(DocKey::Pantry(update.id)).or_insert(0) += 1;
            }

            for upsert in &writes.shopping {
                data.shopping
                    .entry(upsert.slug.clone())
                    .and_modify(|entry| {
                        entry.item_name = upsert.item_name.clone();
                        entry.unit = upsert.unit.clone();
                        entry.quantity = upsert.quantity;
                        entry.needed = upsert.needed;
                        entry.updated_at = upsert.updated_at;
                    })
                    .or_insert_with(|| ShoppingListEntry {
                        user_id,
                        slug: upsert.slug.clone(),
                        item_name: upsert.item_name.clone(),
                        unit: upsert.unit.clone(),
                        quantity: upsert.quantity,
                        needed: upsert.needed,
                        updated_at: upsert.updated_at,
                    });
                *data
                    .versions
                    .entry(DocKey::Shopping(upsert.slug.clone()))
                    .or_insert(0) += 1;
            }

            if let Some(entry) = data.entries.get_mut(&entry_id) {
                if entry.user_id == user_id {
                    entry.confirmed = true;
                    entry.confirmed_at = Some(writes.confirmed_at);
                }
            }
            *data.versions.entry(DocKey::Entry(entry_id)).or_insert(0) += 1;

            Ok(())
        }
    }
}
