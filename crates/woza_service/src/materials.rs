use serde::Deserialize;

use woza_core::models::material::Material;
use woza_core::models::session::{Permission, Session};
use woza_core::rates::normalize_material_id;
use woza_core::validation::{Severity, ValidationError};
use woza_db::StoreError;

use crate::error::{Result, ServiceError};
use crate::WozaService;

/// Partial edit of a catalogue entry. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialUpdate {
    pub name: Option<String>,
    pub unit_price_per_kg: Option<f64>,
    pub co2_saved_per_kg: Option<f64>,
    pub water_saved_liters_per_kg: Option<f64>,
    pub landfill_saved_liters_per_kg: Option<f64>,
    pub active: Option<bool>,
}

impl MaterialUpdate {
    fn apply(self, material: &mut Material) {
        if let Some(name) = self.name {
            material.name = name;
        }
        if let Some(v) = self.unit_price_per_kg {
            material.unit_price_per_kg = v;
        }
        if let Some(v) = self.co2_saved_per_kg {
            material.co2_saved_per_kg = v;
        }
        if let Some(v) = self.water_saved_liters_per_kg {
            material.water_saved_liters_per_kg = v;
        }
        if let Some(v) = self.landfill_saved_liters_per_kg {
            material.landfill_saved_liters_per_kg = v;
        }
        if let Some(active) = self.active {
            material.active = active;
        }
    }
}

/// Catalogue checks, reported with the same shape as collection findings.
fn check_material(material: &Material) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if material.id.is_empty() {
        errors.push(ValidationError {
            code: "MAT-001".to_string(),
            severity: Severity::Error,
            message: "Material id is required".to_string(),
            field: Some("id".to_string()),
        });
    }
    if material.name.trim().is_empty() {
        errors.push(ValidationError {
            code: "MAT-002".to_string(),
            severity: Severity::Error,
            message: "Material name is required".to_string(),
            field: Some("name".to_string()),
        });
    }
    for field in material.invalid_fields() {
        errors.push(ValidationError {
            code: "MAT-003".to_string(),
            severity: Severity::Error,
            message: "Rates and impact coefficients must be zero or more".to_string(),
            field: Some(field.to_string()),
        });
    }

    errors
}

impl WozaService {
    /// Active materials for anyone; inactive ones only for catalogue managers.
    pub async fn list_materials(&self, session: &Session, include_inactive: bool) -> Result<Vec<Material>> {
        if include_inactive {
            session.require(Permission::ManageMaterials)?;
        }
        Ok(self.store.list_materials(include_inactive).await?)
    }

    pub async fn create_material(&self, session: &Session, mut material: Material) -> Result<Material> {
        session.require(Permission::ManageMaterials)?;

        material.id = normalize_material_id(&material.id);
        let errors = check_material(&material);
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        if self.store.get_material(&material.id).await?.is_some() {
            return Err(StoreError::Conflict(format!("material '{}' already exists", material.id)).into());
        }

        self.store.upsert_material(&material).await?;
        tracing::info!(material_id = %material.id, price = material.unit_price_per_kg, "material created");
        Ok(material)
    }

    pub async fn update_material(&self, session: &Session, id: &str, update: MaterialUpdate) -> Result<Material> {
        session.require(Permission::ManageMaterials)?;

        let id = normalize_material_id(id);
        let mut material = self
            .store
            .get_material(&id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("material '{}'", id)))?;

        update.apply(&mut material);
        let errors = check_material(&material);
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        self.store.upsert_material(&material).await?;
        tracing::info!(material_id = %material.id, "material updated");
        Ok(material)
    }

    /// Materials are never deleted; past line items keep referring to them.
    pub async fn deactivate_material(&self, session: &Session, id: &str) -> Result<()> {
        session.require(Permission::ManageMaterials)?;

        let id = normalize_material_id(id);
        self.store.set_material_active(&id, false).await.map_err(|e| match e {
            StoreError::NotFound(what) => ServiceError::NotFound(what),
            other => other.into(),
        })?;
        tracing::info!(material_id = %id, "material deactivated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_price_reported_per_field() {
        let material = Material::new("pet", "PET", -1.0).with_impact(1.5, -2.0, 0.0);
        let codes: Vec<_> = check_material(&material)
            .into_iter()
            .map(|e| (e.code, e.field))
            .collect();

        assert_eq!(
            codes,
            vec![
                ("MAT-003".to_string(), Some("unitPricePerKg".to_string())),
                ("MAT-003".to_string(), Some("waterSavedLitersPerKg".to_string())),
            ]
        );
    }

    #[test]
    fn test_blank_id_and_name() {
        let material = Material::new("  ", " ", 1.0);
        let codes: Vec<_> = check_material(&material).into_iter().map(|e| e.code).collect();
        assert_eq!(codes, vec!["MAT-001", "MAT-002"]);
    }

    #[test]
    fn test_update_only_touches_given_fields() {
        let mut material = Material::new("glass", "Glass", 0.8).with_impact(0.3, 1.2, 1.5);
        MaterialUpdate {
            unit_price_per_kg: Some(1.1),
            ..MaterialUpdate::default()
        }
        .apply(&mut material);

        assert_eq!(material.unit_price_per_kg, 1.1);
        assert_eq!(material.name, "Glass");
        assert_eq!(material.co2_saved_per_kg, 0.3);
        assert!(material.active);
    }
}
