use serde::{Deserialize, Serialize};

use crate::rates::{normalize_material_id, MaterialRate};

// ---------------------------------------------------------------------------
// Material catalogue entry
// Administrators create and edit these; line items only ever reference them.
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    /// Stable identifier, e.g. "aluminium" or "pet"
    pub id: String,

    pub name: String,

    /// Rand paid per kilogram
    pub unit_price_per_kg: f64,

    #[serde(default)]
    pub co2_saved_per_kg: f64,

    #[serde(default)]
    pub water_saved_liters_per_kg: f64,

    #[serde(default)]
    pub landfill_saved_liters_per_kg: f64,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Material {
    pub fn new(id: &str, name: &str, unit_price_per_kg: f64) -> Self {
        Self {
            id: normalize_material_id(id),
            name: name.to_string(),
            unit_price_per_kg,
            co2_saved_per_kg: 0.0,
            water_saved_liters_per_kg: 0.0,
            landfill_saved_liters_per_kg: 0.0,
            active: true,
        }
    }

    pub fn with_impact(mut self, co2_kg: f64, water_liters: f64, landfill_liters: f64) -> Self {
        self.co2_saved_per_kg = co2_kg;
        self.water_saved_liters_per_kg = water_liters;
        self.landfill_saved_liters_per_kg = landfill_liters;
        self
    }

    pub fn rate(&self) -> MaterialRate {
        MaterialRate::new(
            self.unit_price_per_kg,
            self.co2_saved_per_kg,
            self.water_saved_liters_per_kg,
            self.landfill_saved_liters_per_kg,
        )
    }

    /// Names of the numeric fields that are negative or not finite.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        [
            ("unitPricePerKg", self.unit_price_per_kg),
            ("co2SavedPerKg", self.co2_saved_per_kg),
            ("waterSavedLitersPerKg", self.water_saved_liters_per_kg),
            ("landfillSavedLitersPerKg", self.landfill_saved_liters_per_kg),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_finite() || *v < 0.0)
        .map(|(name, _)| name)
        .collect()
    }
}
