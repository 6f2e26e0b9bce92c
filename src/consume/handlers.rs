use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::{auth::AuthUser, state::AppState};

use super::error::ConsumeError;
use super::service;

pub fn routes() -> Router<AppState> {
    Router::new().route("/calendar/:id/confirm", post(confirm_meal))
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub entry_id: Uuid,
    pub confirmed_at: OffsetDateTime,
    pub consumed_items: usize,
    pub flagged_items: usize,
    pub skipped_ingredients: Vec<String>,
}

/// POST /calendar/:id/confirm — the single entry point other layers call.
#[instrument(skip(state))]
pub async fn confirm_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfirmResponse>, (StatusCode, String)> {
    match service::confirm_meal(&state.db, user_id, id).await {
        Ok(confirmation) => Ok(Json(ConfirmResponse {
            entry_id: confirmation.entry_id,
            confirmed_at: confirmation.confirmed_at,
            consumed_items: confirmation.consumed_items,
            flagged_items: confirmation.flagged_items,
            skipped_ingredients: confirmation.skipped_ingredients,
        })),
        Err(e) => {
            let status = match &e {
                ConsumeError::EntryNotFound | ConsumeError::RecipeNotFound => {
                    StatusCode::NOT_FOUND
                }
                ConsumeError::AlreadyConfirmed | ConsumeError::Conflict => StatusCode::CONFLICT,
                ConsumeError::UnknownUnit(_)
                | ConsumeError::MissingIngredientUnit(_)
                | ConsumeError::MissingPantryUnit(_)
                | ConsumeError::UnitFamilyMismatch { .. }
                | ConsumeError::ZeroContainerSize(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ConsumeError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!(error = %e, %user_id, %id, "confirm_meal failed");
            } else {
                warn!(error = %e, %user_id, %id, "confirm_meal rejected");
            }
            Err((status, e.to_string()))
        }
    }
}
