use serde::Deserialize;

/// Request body for a manual shopping-list upsert.
#[derive(Debug, Deserialize)]
pub struct UpsertShoppingItem {
    pub item_name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub needed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SetNeededRequest {
    pub needed: bool,
}
