use serde::Deserialize;

use super::repo::RecipeIngredient;

#[derive(Debug, Deserialize)]
pub struct CreateRecipe {
    pub title: String,
    #[serde(default)]
    pub servings: Option<i32>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}
