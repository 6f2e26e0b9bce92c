use super::error::ConsumeError;

/// Physical dimension a unit measures. Quantities are only comparable
/// within one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFamily {
    Volume,
    Weight,
    Each,
}

/// Conversion factors into base units: milliliters for volume, grams for
/// weight, and 1 for count-based units. The table is immutable; there is no
/// way to register units at runtime.
const UNIT_TABLE: &[(&str, UnitFamily, f64)] = &[
    ("mL", UnitFamily::Volume, 1.0),
    ("L", UnitFamily::Volume, 1000.0),
    ("tsp", UnitFamily::Volume, 4.92892),
    ("tbsp", UnitFamily::Volume, 14.7868),
    ("fl oz", UnitFamily::Volume, 29.5735),
    ("c", UnitFamily::Volume, 240.0),
    ("pt", UnitFamily::Volume, 473.176),
    ("qt", UnitFamily::Volume, 946.353),
    ("gal", UnitFamily::Volume, 3785.41),
    ("g", UnitFamily::Weight, 1.0),
    ("kg", UnitFamily::Weight, 1000.0),
    ("oz", UnitFamily::Weight, 28.3495),
    ("lb", UnitFamily::Weight, 453.592),
    ("ea", UnitFamily::Each, 1.0),
];

fn lookup(unit: &str) -> Result<(UnitFamily, f64), ConsumeError> {
    UNIT_TABLE
        .iter()
        .find(|(symbol, _, _)| *symbol == unit)
        .map(|&(_, family, factor)| (family, factor))
        .ok_or_else(|| ConsumeError::UnknownUnit(unit.to_string()))
}

/// Factor that takes one `unit` into its family's base unit.
pub fn base_factor(unit: &str) -> Result<f64, ConsumeError> {
    lookup(unit).map(|(_, factor)| factor)
}

pub fn family(unit: &str) -> Result<UnitFamily, ConsumeError> {
    lookup(unit).map(|(family, _)| family)
}

/// Convert `quantity` expressed in `unit` into base units.
///
/// Deliberately family-blind: it never converts across volume/weight.
/// Callers are responsible for keeping both sides of a comparison in the
/// same family.
pub fn convert_to_base(quantity: f64, unit: &str) -> Result<f64, ConsumeError> {
    Ok(quantity * base_factor(unit)?)
}
