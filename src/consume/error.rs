use thiserror::Error;

/// Failure classes of the consumption engine. Any of these aborts the whole
/// unit of work; partial pantry deduction is never observable.
#[derive(Debug, Error)]
pub enum ConsumeError {
    #[error("calendar entry not found")]
    EntryNotFound,
    #[error("recipe not found")]
    RecipeNotFound,
    /// Re-running a confirmation would silently subtract inventory twice,
    /// so it is rejected outright.
    #[error("calendar entry is already confirmed")]
    AlreadyConfirmed,
    #[error("unknown unit `{0}`")]
    UnknownUnit(String),
    #[error("ingredient `{0}` has no unit")]
    MissingIngredientUnit(String),
    #[error("pantry item `{0}` has no unit")]
    MissingPantryUnit(String),
    #[error("ingredient `{name}` is measured in `{ingredient_unit}` but pantry item is stocked in `{pantry_unit}`")]
    UnitFamilyMismatch {
        name: String,
        ingredient_unit: String,
        pantry_unit: String,
    },
    /// Container re-derivation would divide by a zero container size.
    #[error("pantry item `{0}` has a container size of zero")]
    ZeroContainerSize(String),
    /// The read set went stale under a concurrent writer; the caller may
    /// retry the whole confirmation.
    #[error("confirmation conflicted with a concurrent change, retry")]
    Conflict,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Store-level failures, kept separate so commit conflicts stay
/// distinguishable from plain I/O errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("concurrent modification detected")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<StoreError> for ConsumeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => ConsumeError::Conflict,
            StoreError::Other(e) => ConsumeError::Store(e),
        }
    }
}
