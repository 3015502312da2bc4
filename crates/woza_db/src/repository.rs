use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

use woza_core::models::collection::{Collection, CollectionStatus, LineItem};
use woza_core::models::material::Material;

use crate::error::{Result, StoreError};
use crate::layout::{SchemaVersion, Statements};
use crate::store::{CollectionFilter, CollectionStore};

// ---------------------------------------------------------------------------
// Row shapes. Statements alias every column back to these names, so the
// same structs serve both schema versions.
// ---------------------------------------------------------------------------
#[derive(Debug, FromRow)]
struct MaterialRow {
    id: String,
    name: String,
    unit_price_per_kg: f64,
    co2_saved_per_kg: f64,
    water_saved_liters_per_kg: f64,
    landfill_saved_liters_per_kg: f64,
    active: bool,
}

impl From<MaterialRow> for Material {
    fn from(row: MaterialRow) -> Self {
        Material {
            id: row.id,
            name: row.name,
            unit_price_per_kg: row.unit_price_per_kg,
            co2_saved_per_kg: row.co2_saved_per_kg,
            water_saved_liters_per_kg: row.water_saved_liters_per_kg,
            landfill_saved_liters_per_kg: row.landfill_saved_liters_per_kg,
            active: row.active,
        }
    }
}

#[derive(Debug, FromRow)]
struct CollectionRow {
    id: Uuid,
    collector_id: Uuid,
    customer_id: Uuid,
    status: String,
    total_weight_kg: f64,
    total_value: f64,
    photo_refs: Vec<String>,
    notes: Option<String>,
    rejection_reason: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl CollectionRow {
    fn into_collection(self, line_items: Vec<LineItem>) -> Result<Collection> {
        Ok(Collection {
            id: self.id,
            collector_id: self.collector_id,
            customer_id: self.customer_id,
            status: self.status.parse()?,
            line_items,
            total_weight_kg: self.total_weight_kg,
            total_value: self.total_value,
            photo_refs: self.photo_refs,
            notes: self.notes,
            rejection_reason: self.rejection_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct LineItemRow {
    collection_id: Uuid,
    material_id: String,
    weight_kg: f64,
    unit_price: f64,
}

/// Postgres-backed store. The schema version is fixed at construction.
pub struct CollectionRepository {
    pool: PgPool,
    version: SchemaVersion,
    sql: Statements,
}

impl CollectionRepository {
    pub fn new(pool: PgPool, version: SchemaVersion) -> Self {
        Self {
            pool,
            version,
            sql: version.layout().statements(),
        }
    }

    /// Builds a repository for whichever supported schema the database has.
    pub async fn connect_detected(pool: PgPool) -> Result<Self> {
        let version = crate::layout::detect_schema(&pool).await?;
        Ok(Self::new(pool, version))
    }

    pub fn schema_version(&self) -> SchemaVersion {
        self.version
    }

    async fn load_line_items(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<LineItem>>> {
        let mut grouped: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
        if ids.is_empty() {
            return Ok(grouped);
        }

        let rows = sqlx::query_as::<_, LineItemRow>(&self.sql.select_line_items)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            grouped.entry(row.collection_id).or_default().push(LineItem {
                material_id: row.material_id,
                weight_kg: row.weight_kg,
                unit_price: row.unit_price,
            });
        }
        Ok(grouped)
    }

    async fn attach_line_items(&self, rows: Vec<CollectionRow>) -> Result<Vec<Collection>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut items = self.load_line_items(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_collection(lines)
            })
            .collect()
    }
}

#[async_trait]
impl CollectionStore for CollectionRepository {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn list_materials(&self, include_inactive: bool) -> Result<Vec<Material>> {
        let layout = self.version.layout();
        let mut query = QueryBuilder::<Postgres>::new(&self.sql.select_materials);
        if !include_inactive {
            query.push(format!(" WHERE {} = TRUE", layout.material_active));
        }
        query.push(" ORDER BY id");

        let rows = query
            .build_query_as::<MaterialRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Material::from).collect())
    }

    async fn get_material(&self, id: &str) -> Result<Option<Material>> {
        let sql = format!("{} WHERE id = $1", self.sql.select_materials);
        let row = sqlx::query_as::<_, MaterialRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Material::from))
    }

    async fn upsert_material(&self, material: &Material) -> Result<()> {
        sqlx::query(&self.sql.upsert_material)
            .bind(&material.id)
            .bind(&material.name)
            .bind(material.unit_price_per_kg)
            .bind(material.co2_saved_per_kg)
            .bind(material.water_saved_liters_per_kg)
            .bind(material.landfill_saved_liters_per_kg)
            .bind(material.active)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_material_active(&self, id: &str, active: bool) -> Result<()> {
        let result = sqlx::query(&self.sql.set_material_active)
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("material '{}'", id)));
        }
        Ok(())
    }

    async fn insert_collection(&self, c: &Collection) -> Result<()> {
        sqlx::query(&self.sql.insert_collection)
            .bind(c.id)
            .bind(c.collector_id)
            .bind(c.customer_id)
            .bind(c.status.as_str())
            .bind(c.total_weight_kg)
            .bind(c.total_value)
            .bind(&c.photo_refs)
            .bind(&c.notes)
            .bind(&c.rejection_reason)
            .bind(c.created_at)
            .bind(c.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_line_items(&self, collection_id: Uuid, items: &[LineItem]) -> Result<()> {
        // The batch is all-or-nothing; it is independent of the parent write.
        let mut tx = self.pool.begin().await?;

        for item in items {
            sqlx::query(&self.sql.insert_line_item)
                .bind(collection_id)
                .bind(&item.material_id)
                .bind(item.weight_kg)
                .bind(item.unit_price)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_collection(&self, id: Uuid) -> Result<Option<Collection>> {
        let sql = format!("{} WHERE id = $1", self.sql.select_collections);
        let row = sqlx::query_as::<_, CollectionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.attach_line_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_collections(&self, filter: &CollectionFilter) -> Result<Vec<Collection>> {
        let layout = self.version.layout();
        let mut query = QueryBuilder::<Postgres>::new(&self.sql.select_collections);
        query.push(" WHERE TRUE");

        if let Some(id) = filter.collector_id {
            query.push(" AND collector_id = ").push_bind(id);
        }
        if let Some(id) = filter.customer_id {
            query.push(format!(" AND {} = ", layout.customer)).push_bind(id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(from) = filter.from {
            query.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND created_at < ").push_bind(to);
        }

        query.push(" ORDER BY created_at DESC, id");
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit.max(0));
        }
        if let Some(offset) = filter.offset {
            query.push(" OFFSET ").push_bind(offset.max(0));
        }

        let rows = query
            .build_query_as::<CollectionRow>()
            .fetch_all(&self.pool)
            .await?;
        self.attach_line_items(rows).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: CollectionStatus,
        to: CollectionStatus,
        rejection_reason: Option<&str>,
        at: OffsetDateTime,
    ) -> Result<()> {
        let result = sqlx::query(&self.sql.update_status)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(rejection_reason)
            .bind(at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Nothing matched: either the record is gone or someone moved it first
        let current: Option<String> = sqlx::query_scalar(&self.sql.status_of)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match current {
            None => Err(StoreError::NotFound(format!("collection {}", id))),
            Some(status) => Err(StoreError::Conflict(format!(
                "collection {} is {}, expected {}",
                id, status, from
            ))),
        }
    }
}
