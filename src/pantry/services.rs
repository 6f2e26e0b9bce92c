use anyhow::Context;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{CreatePantryItem, ScannedItemDraft, UpdatePantryItem};
use super::repo::{self, PantryItem};

/// Fold a scanned item into the pantry.
///
/// A draft carrying a barcode merges into the existing item with that
/// barcode: counts add up, and container sizes are summed only when both
/// sides carry a non-zero size. Anything else becomes a new item.
pub async fn upsert_scanned(
    db: &PgPool,
    user_id: Uuid,
    draft: &ScannedItemDraft,
) -> anyhow::Result<PantryItem> {
    if let Some(barcode) = draft.barcode.as_deref() {
        if let Some(existing) = repo::find_by_barcode(db, user_id, barcode).await? {
            debug!(item_id = %existing.id, barcode, "merging scanned item into existing");

            let new_count = existing.count + draft.count.unwrap_or(1);
            let new_quantity = match draft.quantity {
                Some(q) if existing.quantity != 0.0 => existing.quantity + q,
                _ => existing.quantity,
            };

            let patch = UpdatePantryItem {
                count: Some(new_count),
                quantity: Some(new_quantity),
                ..Default::default()
            };
            let merged = repo::update(db, user_id, existing.id, &patch)
                .await?
                .context("pantry item disappeared during merge")?;
            return Ok(merged);
        }
    }

    let new = CreatePantryItem {
        name: draft.name.clone(),
        unit: draft.unit.clone(),
        quantity: draft.quantity.unwrap_or(0.0),
        count: draft.count.unwrap_or(1),
        low_threshold: None,
        category: None,
        barcode: draft.barcode.clone(),
    };
    let item = repo::create(db, user_id, &new).await?;
    info!(item_id = %item.id, name = %item.name, "scanned item created");
    Ok(item)
}
