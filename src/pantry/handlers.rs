use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{auth::AuthUser, state::AppState};

use super::dto::{CreatePantryItem, ScannedItemDraft, UpdatePantryItem};
use super::repo::{self, PantryItem};
use super::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pantry", get(list_items).post(create_item))
        .route("/pantry/low", get(list_low_stock))
        .route("/pantry/scanned", post(upsert_scanned))
        .route(
            "/pantry/:id",
            get(get_item).patch(update_item).delete(delete_item),
        )
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PantryItem>>, (StatusCode, String)> {
    let items = repo::list(&state.db, user_id).await.map_err(internal)?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn list_low_stock(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PantryItem>>, (StatusCode, String)> {
    let items = repo::list_low_stock(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PantryItem>, (StatusCode, String)> {
    match repo::get(&state.db, user_id, id).await.map_err(internal)? {
        Some(item) => Ok(Json(item)),
        None => Err((StatusCode::NOT_FOUND, "Pantry item not found".into())),
    }
}

#[instrument(skip(state, body))]
pub async fn create_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreatePantryItem>,
) -> Result<(StatusCode, Json<PantryItem>), (StatusCode, String)> {
    if body.name.trim().is_empty() {
        warn!("pantry create with empty name");
        return Err((StatusCode::BAD_REQUEST, "name is required".into()));
    }
    if body.quantity < 0.0 || body.count < 0 {
        warn!(quantity = body.quantity, count = body.count, "negative stock rejected");
        return Err((
            StatusCode::BAD_REQUEST,
            "quantity and count must be non-negative".into(),
        ));
    }

    let item = repo::create(&state.db, user_id, &body)
        .await
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state, body))]
pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePantryItem>,
) -> Result<Json<PantryItem>, (StatusCode, String)> {
    if body.quantity.is_some_and(|q| q < 0.0) || body.count.is_some_and(|c| c < 0) {
        warn!(%id, "negative stock rejected");
        return Err((
            StatusCode::BAD_REQUEST,
            "quantity and count must be non-negative".into(),
        ));
    }

    match repo::update(&state.db, user_id, id, &body)
        .await
        .map_err(internal)?
    {
        Some(item) => Ok(Json(item)),
        None => Err((StatusCode::NOT_FOUND, "Pantry item not found".into())),
    }
}

#[instrument(skip(state, body))]
pub async fn upsert_scanned(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<ScannedItemDraft>,
) -> Result<Json<PantryItem>, (StatusCode, String)> {
    if body.name.trim().is_empty() {
        warn!("scanned item with empty name");
        return Err((StatusCode::BAD_REQUEST, "name is required".into()));
    }

    let item = services::upsert_scanned(&state.db, user_id, &body)
        .await
        .map_err(internal)?;
    Ok(Json(item))
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if repo::delete(&state.db, user_id, id).await.map_err(internal)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Pantry item not found".into()))
    }
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
