use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreatePantryItem {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub low_threshold: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePantryItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub low_threshold: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
}

/// A scanned item as the scanner hands it over, before it is merged into
/// the pantry.
#[derive(Debug, Deserialize)]
pub struct ScannedItemDraft {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub barcode: Option<String>,
}
