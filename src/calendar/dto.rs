use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use super::repo::MealType;

#[derive(Debug, Deserialize)]
pub struct CreateCalendarEntry {
    pub date: Date,
    pub meal: MealType,
    pub recipe_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Date,
}
