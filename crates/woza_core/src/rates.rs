//! Material Rate Table: price per kilogram and environmental coefficients
//! for every material the platform buys.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::material::Material;

/// Canonical form of a material identifier: trimmed and lowercased.
pub fn normalize_material_id(id: &str) -> String {
    id.trim().to_lowercase()
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRate {
    pub unit_price_per_kg: f64,
    pub co2_kg_per_kg: f64,
    pub water_liters_per_kg: f64,
    pub landfill_liters_per_kg: f64,
}

impl MaterialRate {
    /// Negative or non-finite inputs are stored as zero so that every
    /// figure derived from the table stays non-negative.
    pub fn new(unit_price_per_kg: f64, co2: f64, water: f64, landfill: f64) -> Self {
        Self {
            unit_price_per_kg: sanitize(unit_price_per_kg),
            co2_kg_per_kg: sanitize(co2),
            water_liters_per_kg: sanitize(water),
            landfill_liters_per_kg: sanitize(landfill),
        }
    }

    pub fn priced(unit_price_per_kg: f64) -> Self {
        Self::new(unit_price_per_kg, 0.0, 0.0, 0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, MaterialRate>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, material_id: &str, rate: MaterialRate) -> Self {
        self.insert(material_id, rate);
        self
    }

    pub fn insert(&mut self, material_id: &str, rate: MaterialRate) {
        self.rates.insert(normalize_material_id(material_id), rate);
    }

    /// Builds the table from the catalogue. Inactive materials are left out.
    pub fn from_materials<'a>(materials: impl IntoIterator<Item = &'a Material>) -> Self {
        let mut table = Self::new();
        for material in materials.into_iter().filter(|m| m.active) {
            table.insert(&material.id, material.rate());
        }
        table
    }

    pub fn get(&self, material_id: &str) -> Option<&MaterialRate> {
        self.rates.get(&normalize_material_id(material_id))
    }

    pub fn contains(&self, material_id: &str) -> bool {
        self.get(material_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Material identifiers in sorted order.
    pub fn material_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.rates.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case_and_whitespace() {
        let table = RateTable::new().with_rate("Aluminium", MaterialRate::priced(12.0));

        assert!(table.contains("aluminium"));
        assert!(table.contains("  ALUMINIUM "));
        assert_eq!(table.get("aluminium").unwrap().unit_price_per_kg, 12.0);
        assert!(table.get("glass").is_none());
    }

    #[test]
    fn test_negative_coefficients_are_zeroed() {
        let rate = MaterialRate::new(-1.0, f64::NAN, 3.0, f64::INFINITY);
        assert_eq!(rate.unit_price_per_kg, 0.0);
        assert_eq!(rate.co2_kg_per_kg, 0.0);
        assert_eq!(rate.water_liters_per_kg, 3.0);
        assert_eq!(rate.landfill_liters_per_kg, 0.0);
    }

    #[test]
    fn test_inactive_materials_are_excluded() {
        let mut paper = Material::new("paper", "Paper", 1.2);
        paper.active = false;
        let glass = Material::new("glass", "Glass", 0.5);

        let table = RateTable::from_materials([&paper, &glass]);
        assert_eq!(table.material_ids(), vec!["glass"]);
    }
}
