use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{auth::AuthUser, state::AppState};

use super::dto::{CreateCalendarEntry, DayQuery};
use super::repo::{self, CalendarEntry, DeleteOutcome};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/calendar", get(list_for_date).post(create_entry))
        .route("/calendar/:id", get(get_entry).delete(delete_entry))
}

#[instrument(skip(state))]
pub async fn list_for_date(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DayQuery>,
) -> Result<Json<Vec<CalendarEntry>>, (StatusCode, String)> {
    let entries = repo::list_for_date(&state.db, user_id, q.date)
        .await
        .map_err(internal)?;
    Ok(Json(entries))
}

#[instrument(skip(state))]
pub async fn get_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CalendarEntry>, (StatusCode, String)> {
    match repo::get(&state.db, user_id, id).await.map_err(internal)? {
        Some(entry) => Ok(Json(entry)),
        None => Err((StatusCode::NOT_FOUND, "Calendar entry not found".into())),
    }
}

#[instrument(skip(state, body))]
pub async fn create_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateCalendarEntry>,
) -> Result<(StatusCode, Json<CalendarEntry>), (StatusCode, String)> {
    let entry = repo::create(&state.db, user_id, body.date, body.meal, body.recipe_id)
        .await
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    match repo::delete_unconfirmed(&state.db, user_id, id)
        .await
        .map_err(internal)?
    {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeleteOutcome::Confirmed => {
            warn!(%id, "refusing to delete confirmed entry");
            Err((
                StatusCode::CONFLICT,
                "Confirmed entries cannot be deleted".into(),
            ))
        }
        DeleteOutcome::NotFound => Err((StatusCode::NOT_FOUND, "Calendar entry not found".into())),
    }
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
