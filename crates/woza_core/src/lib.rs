pub mod error;
pub mod impact;
pub mod models;
pub mod rates;
pub mod validation;

pub use error::{Error, Result};
pub use impact::{ImpactCalculator, ImpactEntry, ImpactParams, ImpactResult};
pub use rates::{MaterialRate, RateTable};

use models::material::Material;
use validation::{rules, ValidationEngine};

pub fn submission_validator() -> ValidationEngine {
    ValidationEngine::new()
        .add_rule(rules::ResidentSelected)
        .add_rule(rules::HasPositiveWeight)
        .add_rule(rules::MaterialNamed)
        .add_rule(rules::KnownMaterial)
        .add_rule(rules::WeightNotNegative)
        .add_rule(rules::ZeroWeightRow)
}

/// The starter catalogue loaded into a fresh database.
/// Prices are rand per kg; savings are per kg of material diverted.
pub fn default_materials() -> Vec<Material> {
    vec![
        // Metals
        Material::new("aluminium", "Aluminium cans", 12.00).with_impact(9.0, 5.0, 3.0),
        Material::new("tin", "Tin / steel cans", 2.00).with_impact(1.8, 4.0, 2.5),

        // Plastics
        Material::new("pet", "PET bottles", 4.50).with_impact(1.5, 17.0, 7.4),
        Material::new("hdpe", "HDPE containers", 3.00).with_impact(1.4, 15.0, 6.0),
        Material::new("plastic", "Mixed plastic", 2.50).with_impact(1.5, 10.0, 5.0),

        // Fibre
        Material::new("cardboard", "Cardboard", 1.20).with_impact(0.9, 26.0, 4.0),
        Material::new("paper", "White paper", 1.00).with_impact(1.0, 26.0, 3.5),

        // Glass
        Material::new("glass", "Glass bottles", 0.80).with_impact(0.3, 1.2, 1.5),
    ]
}

pub fn default_rate_table() -> RateTable {
    RateTable::from_materials(&default_materials())
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::collection::CollectionDraft;
    use uuid::Uuid;

    #[test]
    fn test_default_catalogue_prices_aluminium_at_twelve() {
        let table = default_rate_table();
        assert_eq!(table.len(), default_materials().len());

        let calc = ImpactCalculator::new(&table, ImpactParams::default());
        let result = calc.compute_impact(&[ImpactEntry::new("aluminium", 2.5)]);
        assert_eq!(result.total_value, 30.0);
        assert_eq!(result.total_weight_kg, 2.5);
    }

    #[test]
    fn test_default_catalogue_is_valid() {
        for m in default_materials() {
            assert!(m.invalid_fields().is_empty(), "{} has invalid fields", m.id);
        }
    }

    #[test]
    fn test_submission_validator_collects_every_failure() {
        let draft = CollectionDraft::default().entry("copper", -2.0);

        let errors = submission_validator().run(&draft, &default_rate_table());
        let codes: Vec<&str> = errors.iter().map(|e| e.code.as_str()).collect();

        // No resident, nothing positive, unknown material, negative weight
        assert_eq!(codes, vec!["COL-001", "COL-002", "COL-004", "COL-005"]);
        assert!(validation::has_blocking(&errors));
    }

    #[test]
    fn test_clean_draft_passes() {
        let draft = CollectionDraft::for_customer(Uuid::new_v4())
            .entry("pet", 3.2)
            .entry("glass", 1.0);
        let errors = submission_validator().run(&draft, &default_rate_table());
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }
}
