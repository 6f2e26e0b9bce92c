use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{error, instrument, warn};

use crate::{auth::AuthUser, state::AppState};

use super::dto::{SetNeededRequest, UpsertShoppingItem};
use super::repo::{self, ShoppingListEntry};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shopping-list", get(list_entries).put(upsert_entry))
        .route("/shopping-list/:slug", patch(set_needed))
}

#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ShoppingListEntry>>, (StatusCode, String)> {
    let entries = repo::list(&state.db, user_id).await.map_err(internal)?;
    Ok(Json(entries))
}

#[instrument(skip(state, body))]
pub async fn upsert_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<UpsertShoppingItem>,
) -> Result<Json<ShoppingListEntry>, (StatusCode, String)> {
    if body.item_name.trim().is_empty() {
        warn!("shopping upsert with empty item name");
        return Err((StatusCode::BAD_REQUEST, "item_name is required".into()));
    }

    let entry = repo::upsert(
        &state.db,
        user_id,
        &body.item_name,
        body.unit.as_deref().unwrap_or(""),
        body.quantity.unwrap_or(1.0),
        body.needed.unwrap_or(true),
    )
    .await
    .map_err(internal)?;
    Ok(Json(entry))
}

#[instrument(skip(state))]
pub async fn set_needed(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(slug): Path<String>,
    Json(body): Json<SetNeededRequest>,
) -> Result<Json<ShoppingListEntry>, (StatusCode, String)> {
    match repo::set_needed(&state.db, user_id, &slug, body.needed).await {
        Ok(Some(entry)) => Ok(Json(entry)),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Shopping-list entry not found".into())),
        Err(e) => {
            error!(error = %e, %user_id, slug, "set_needed failed");
            Err(internal(e))
        }
    }
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
