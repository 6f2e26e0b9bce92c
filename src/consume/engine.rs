use time::OffsetDateTime;
use uuid::Uuid;

use crate::calendar::repo::CalendarEntry;
use crate::pantry::repo::PantryItem;
use crate::recipes::repo::{Recipe, RecipeIngredient};
use crate::shopping::slugify;

use super::error::ConsumeError;
use super::units::{base_factor, convert_to_base, family};

/// Consistent snapshot assembled by the transaction reader: the entry, its
/// recipe, and every referenced pantry item, loaded before any write.
#[derive(Debug)]
pub struct ReadSet {
    pub entry: CalendarEntry,
    pub recipe: Recipe,
    /// Each ingredient paired with its pantry item. `None` marks an
    /// unresolved reference, which is skipped rather than treated as an
    /// error.
    pub items: Vec<(RecipeIngredient, Option<PantryItem>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PantryUpdate {
    pub id: Uuid,
    pub count: i64,
    pub quantity: f64,
    pub last_updated: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingUpsert {
    pub slug: String,
    pub item_name: String,
    pub unit: String,
    pub quantity: f64,
    pub needed: bool,
    pub updated_at: OffsetDateTime,
}

/// Everything the writer applies in one atomic commit.
#[derive(Debug, Clone)]
pub struct WriteSet {
    pub pantry: Vec<PantryUpdate>,
    pub shopping: Vec<ShoppingUpsert>,
    pub confirmed_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct Plan {
    pub writes: WriteSet,
    /// Names of ingredients that were not consumable (no pantry reference,
    /// or the referenced item no longer exists).
    pub skipped: Vec<String>,
}

/// The computing stage: a pure function from read set to write set, with no
/// store access. Any malformed unit data fails the whole plan.
pub fn plan(read: &ReadSet, now: OffsetDateTime) -> Result<Plan, ConsumeError> {
    let mut writes = WriteSet {
        pantry: Vec::new(),
        shopping: Vec::new(),
        confirmed_at: now,
    };
    let mut skipped = Vec::new();

    for (ingredient, item) in &read.items {
        match item {
            Some(item) => consume_ingredient(ingredient, item, now, &mut writes)?,
            None => skipped.push(ingredient.name.clone()),
        }
    }

    Ok(Plan { writes, skipped })
}

fn consume_ingredient(
    ingredient: &RecipeIngredient,
    item: &PantryItem,
    now: OffsetDateTime,
    writes: &mut WriteSet,
) -> Result<(), ConsumeError> {
    let ingredient_unit = ingredient
        .unit
        .as_deref()
        .ok_or_else(|| ConsumeError::MissingIngredientUnit(ingredient.name.clone()))?;
    let pantry_unit = item
        .unit
        .as_deref()
        .ok_or_else(|| ConsumeError::MissingPantryUnit(item.name.clone()))?;

    if family(ingredient_unit)? != family(pantry_unit)? {
        return Err(ConsumeError::UnitFamilyMismatch {
            name: ingredient.name.clone(),
            ingredient_unit: ingredient_unit.to_string(),
            pantry_unit: pantry_unit.to_string(),
        });
    }
    let total_base = convert_to_base(item.quantity * item.count as f64, pantry_unit)?;
    let recipe_base = convert_to_base(ingredient.quantity, ingredient_unit)?;

    // Not clamped at zero: over-consumption is recorded as-is and flagged.
    let new_total_base = total_base - recipe_base;
    let new_total = new_total_base / base_factor(pantry_unit)?;

    let (new_count, new_quantity) = if new_total < item.quantity {
        // Less than one full container left; the remainder is carried
        // entirely in `quantity`.
        (0, new_total)
    } else {
        if item.quantity == 0.0 {
            return Err(ConsumeError::ZeroContainerSize(item.name.clone()));
        }
        (
            (new_total / item.quantity).floor() as i64,
            new_total % item.quantity,
        )
    };

    writes.pantry.push(PantryUpdate {
        id: item.id,
        count: new_count,
        quantity: new_quantity,
        last_updated: now,
    });

    if new_total_base <= 0.0 {
        writes.shopping.push(ShoppingUpsert {
            slug: slugify(&item.name),
            item_name: item.name.clone(),
            unit: pantry_unit.to_string(),
            quantity: 1.0,
            needed: true,
            updated_at: now,
        });
    }

    Ok(())
}
