mod dto;
pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub use repo::slugify;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}
