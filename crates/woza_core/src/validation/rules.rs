use crate::models::collection::CollectionDraft;
use crate::rates::RateTable;
use crate::validation::{Severity, ValidationError, ValidationRule};

fn entry_field(index: usize) -> Option<String> {
    Some(format!("entries[{}]", index))
}

// =========================================================================
// RULE: COL-001
// "A resident must be selected"
// =========================================================================
pub struct ResidentSelected;

impl ValidationRule for ResidentSelected {
    fn rule_id(&self) -> &str { "COL-001" }

    fn check(&self, draft: &CollectionDraft, _rates: &RateTable) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if draft.customer_id.is_none() {
            errors.push(ValidationError {
                code: self.rule_id().to_string(),
                severity: Severity::Error,
                message: "Select the resident this collection was made from".to_string(),
                field: Some("customerId".to_string()),
            });
        }
        errors
    }
}

// =========================================================================
// RULE: COL-002
// "At least one material row must carry a weight above zero"
// =========================================================================
pub struct HasPositiveWeight;

impl ValidationRule for HasPositiveWeight {
    fn rule_id(&self) -> &str { "COL-002" }

    fn check(&self, draft: &CollectionDraft, _rates: &RateTable) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if draft.positive_entries().next().is_none() {
            errors.push(ValidationError {
                code: self.rule_id().to_string(),
                severity: Severity::Error,
                message: "Enter a weight above zero for at least one material".to_string(),
                field: Some("entries".to_string()),
            });
        }
        errors
    }
}

// =========================================================================
// RULE: COL-003
// "Every row must name a material"
// =========================================================================
pub struct MaterialNamed;

impl ValidationRule for MaterialNamed {
    fn rule_id(&self) -> &str { "COL-003" }

    fn check(&self, draft: &CollectionDraft, _rates: &RateTable) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for (i, entry) in draft.entries.iter().enumerate() {
            if entry.material_id.trim().is_empty() {
                errors.push(ValidationError {
                    code: self.rule_id().to_string(),
                    severity: Severity::Error,
                    message: format!("Row {} has no material selected", i + 1),
                    field: entry_field(i),
                });
            }
        }
        errors
    }
}

// =========================================================================
// RULE: COL-004
// "Named materials must exist in the active catalogue"
// =========================================================================
pub struct KnownMaterial;

impl ValidationRule for KnownMaterial {
    fn rule_id(&self) -> &str { "COL-004" }

    fn check(&self, draft: &CollectionDraft, rates: &RateTable) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for (i, entry) in draft.entries.iter().enumerate() {
            // Blank rows are COL-003's concern
            if entry.material_id.trim().is_empty() {
                continue;
            }
            if !rates.contains(&entry.material_id) {
                errors.push(ValidationError {
                    code: self.rule_id().to_string(),
                    severity: Severity::Error,
                    message: format!("Material '{}' is not in the active catalogue", entry.material_id),
                    field: entry_field(i),
                });
            }
        }
        errors
    }
}

// =========================================================================
// RULE: COL-005
// "Weights may not be negative or non-numeric"
// =========================================================================
pub struct WeightNotNegative;

impl ValidationRule for WeightNotNegative {
    fn rule_id(&self) -> &str { "COL-005" }

    fn check(&self, draft: &CollectionDraft, _rates: &RateTable) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for (i, entry) in draft.entries.iter().enumerate() {
            if !entry.weight_kg.is_finite() || entry.weight_kg < 0.0 {
                errors.push(ValidationError {
                    code: self.rule_id().to_string(),
                    severity: Severity::Error,
                    message: format!("Row {} has an invalid weight: {}", i + 1, entry.weight_kg),
                    field: entry_field(i),
                });
            }
        }
        errors
    }
}

// =========================================================================
// RULE: COL-006 (warning)
// "Rows weighing exactly zero are dropped on submit"
// =========================================================================
pub struct ZeroWeightRow;

impl ValidationRule for ZeroWeightRow {
    fn rule_id(&self) -> &str { "COL-006" }

    fn check(&self, draft: &CollectionDraft, _rates: &RateTable) -> Vec<ValidationError> {
        draft
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.weight_kg == 0.0)
            .map(|(i, e)| ValidationError {
                code: self.rule_id().to_string(),
                severity: Severity::Warning,
                message: format!("Row {} ({}) weighs 0 kg and will not be recorded", i + 1, e.material_id),
                field: entry_field(i),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::MaterialRate;
    use uuid::Uuid;

    fn rates() -> RateTable {
        RateTable::new().with_rate("pet", MaterialRate::priced(1.5))
    }

    #[test]
    fn test_resident_required() {
        let draft = CollectionDraft::default().entry("pet", 2.0);
        let errors = ResidentSelected.check(&draft, &rates());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field.as_deref(), Some("customerId"));
    }

    #[test]
    fn test_all_zero_rows_fail_positive_weight() {
        let draft = CollectionDraft::for_customer(Uuid::new_v4())
            .entry("pet", 0.0)
            .entry("pet", 0.0);
        assert_eq!(HasPositiveWeight.check(&draft, &rates()).len(), 1);
        assert_eq!(ZeroWeightRow.check(&draft, &rates()).len(), 2);
    }

    #[test]
    fn test_unknown_and_blank_materials_reported_once_each() {
        let draft = CollectionDraft::for_customer(Uuid::new_v4())
            .entry("  ", 1.0)
            .entry("copper", 1.0);

        let named = MaterialNamed.check(&draft, &rates());
        let known = KnownMaterial.check(&draft, &rates());

        assert_eq!(named.len(), 1);
        assert_eq!(named[0].field.as_deref(), Some("entries[0]"));
        assert_eq!(known.len(), 1);
        assert_eq!(known[0].field.as_deref(), Some("entries[1]"));
    }

    #[test]
    fn test_negative_weight_is_an_error() {
        let draft = CollectionDraft::for_customer(Uuid::new_v4())
            .entry("pet", -1.0)
            .entry("pet", f64::INFINITY);
        assert_eq!(WeightNotNegative.check(&draft, &rates()).len(), 2);
    }
}
