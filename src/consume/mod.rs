//! Meal-confirmation consumption engine.
//!
//! Confirming a scheduled meal deducts the recipe's ingredient quantities
//! from pantry stock (converting across units within one family), re-derives
//! each item's container count and remainder, flags depleted items onto the
//! shopping list, and marks the calendar entry confirmed — as a single
//! all-or-nothing unit of work against concurrent readers and writers.

pub mod engine;
pub mod error;
pub mod handlers;
pub mod service;
pub mod store;
pub mod units;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}
