//! Supported database layouts.
//!
//! Older deployments still run the original "pickups" tables. The layout is
//! detected once when the repository is built and never re-probed per call.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    Current,
    Legacy,
}

impl SchemaVersion {
    pub fn layout(self) -> &'static SchemaLayout {
        match self {
            SchemaVersion::Current => &CURRENT,
            SchemaVersion::Legacy => &LEGACY,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::Current => f.write_str("current"),
            SchemaVersion::Legacy => f.write_str("legacy"),
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current" => Ok(SchemaVersion::Current),
            "legacy" => Ok(SchemaVersion::Legacy),
            other => Err(StoreError::UnknownSchema(other.to_string())),
        }
    }
}

/// Physical table and column names for one schema version.
#[derive(Debug, PartialEq, Eq)]
pub struct SchemaLayout {
    pub version: SchemaVersion,

    pub materials: &'static str,
    pub material_price: &'static str,
    pub material_active: &'static str,

    pub collections: &'static str,
    pub customer: &'static str,
    pub total_weight: &'static str,
    pub total_value: &'static str,

    pub line_items: &'static str,
    pub line_collection: &'static str,
    pub line_weight: &'static str,
    pub line_price: &'static str,
}

pub static CURRENT: SchemaLayout = SchemaLayout {
    version: SchemaVersion::Current,
    materials: "materials",
    material_price: "unit_price_per_kg",
    material_active: "active",
    collections: "collections",
    customer: "customer_id",
    total_weight: "total_weight_kg",
    total_value: "total_value",
    line_items: "collection_line_items",
    line_collection: "collection_id",
    line_weight: "weight_kg",
    line_price: "unit_price",
};

pub static LEGACY: SchemaLayout = SchemaLayout {
    version: SchemaVersion::Legacy,
    materials: "materials",
    material_price: "rate_per_kg",
    material_active: "is_active",
    collections: "pickups",
    customer: "resident_id",
    total_weight: "total_kg",
    total_value: "total_amount",
    line_items: "pickup_items",
    line_collection: "pickup_id",
    line_weight: "kg",
    line_price: "price_per_kg",
};

/// SQL text for every statement the repository issues, rendered once.
#[derive(Debug, Clone)]
pub struct Statements {
    pub select_materials: String,
    pub upsert_material: String,
    pub set_material_active: String,
    pub insert_collection: String,
    pub insert_line_item: String,
    pub select_collections: String,
    pub select_line_items: String,
    pub update_status: String,
    pub status_of: String,
}

impl SchemaLayout {
    pub fn statements(&self) -> Statements {
        let l = self;
        Statements {
            select_materials: format!(
                "SELECT id, name, {price} AS unit_price_per_kg, co2_saved_per_kg, \
                 water_saved_liters_per_kg, landfill_saved_liters_per_kg, {active} AS active \
                 FROM {materials}",
                price = l.material_price,
                active = l.material_active,
                materials = l.materials,
            ),
            upsert_material: format!(
                "INSERT INTO {materials} (id, name, {price}, co2_saved_per_kg, \
                 water_saved_liters_per_kg, landfill_saved_liters_per_kg, {active}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, \
                 {price} = EXCLUDED.{price}, co2_saved_per_kg = EXCLUDED.co2_saved_per_kg, \
                 water_saved_liters_per_kg = EXCLUDED.water_saved_liters_per_kg, \
                 landfill_saved_liters_per_kg = EXCLUDED.landfill_saved_liters_per_kg, \
                 {active} = EXCLUDED.{active}",
                materials = l.materials,
                price = l.material_price,
                active = l.material_active,
            ),
            set_material_active: format!(
                "UPDATE {materials} SET {active} = $2 WHERE id = $1",
                materials = l.materials,
                active = l.material_active,
            ),
            insert_collection: format!(
                "INSERT INTO {collections} (id, collector_id, {customer}, status, {weight}, {value}, \
                 photo_refs, notes, rejection_reason, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
                collections = l.collections,
                customer = l.customer,
                weight = l.total_weight,
                value = l.total_value,
            ),
            insert_line_item: format!(
                "INSERT INTO {items} ({collection}, material_id, {weight}, {price}) \
                 VALUES ($1, $2, $3, $4)",
                items = l.line_items,
                collection = l.line_collection,
                weight = l.line_weight,
                price = l.line_price,
            ),
            select_collections: format!(
                "SELECT id, collector_id, {customer} AS customer_id, status, \
                 {weight} AS total_weight_kg, {value} AS total_value, photo_refs, notes, \
                 rejection_reason, created_at, updated_at FROM {collections}",
                customer = l.customer,
                weight = l.total_weight,
                value = l.total_value,
                collections = l.collections,
            ),
            select_line_items: format!(
                "SELECT {collection} AS collection_id, material_id, {weight} AS weight_kg, \
                 {price} AS unit_price FROM {items} WHERE {collection} = ANY($1) ORDER BY id",
                collection = l.line_collection,
                weight = l.line_weight,
                price = l.line_price,
                items = l.line_items,
            ),
            update_status: format!(
                "UPDATE {collections} SET status = $3, rejection_reason = COALESCE($4, rejection_reason), \
                 updated_at = $5 WHERE id = $1 AND status = $2",
                collections = l.collections,
            ),
            status_of: format!("SELECT status FROM {} WHERE id = $1", l.collections),
        }
    }
}

/// Probes the connected database once and picks the matching layout.
pub async fn detect_schema(pool: &PgPool) -> Result<SchemaVersion> {
    for version in [SchemaVersion::Current, SchemaVersion::Legacy] {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )
            "#,
        )
        .bind(version.layout().collections)
        .fetch_one(pool)
        .await?;

        if exists {
            tracing::info!(schema = %version, "detected collection schema");
            return Ok(version);
        }
    }
    Err(StoreError::UnknownSchema(
        "neither 'collections' nor 'pickups' table exists".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_statements_use_canonical_names() {
        let s = CURRENT.statements();
        assert!(s.insert_collection.starts_with("INSERT INTO collections (id, collector_id, customer_id"));
        assert!(s.select_line_items.contains("FROM collection_line_items WHERE collection_id = ANY($1)"));
    }

    #[test]
    fn test_legacy_statements_alias_back_to_canonical_names() {
        let s = LEGACY.statements();
        assert!(s.select_collections.contains("resident_id AS customer_id"));
        assert!(s.select_collections.contains("total_kg AS total_weight_kg"));
        assert!(s.select_collections.ends_with("FROM pickups"));
        assert!(s.select_materials.contains("rate_per_kg AS unit_price_per_kg"));
        assert!(s.insert_line_item.starts_with("INSERT INTO pickup_items (pickup_id, material_id, kg, price_per_kg)"));
    }

    #[test]
    fn test_version_parse() {
        assert_eq!("Legacy".parse::<SchemaVersion>().unwrap(), SchemaVersion::Legacy);
        assert!("v3".parse::<SchemaVersion>().is_err());
        assert_eq!(SchemaVersion::Current.layout(), &CURRENT);
    }
}
