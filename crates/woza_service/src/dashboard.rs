//! Read-side aggregates for the office and customer dashboards.
//!
//! Every figure is re-derived from persisted line items through the same
//! calculator used at submission time. The reducers are plain functions over
//! a slice of collections so they can be tested without a store.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use woza_core::impact::{ImpactCalculator, ImpactResult};
use woza_core::models::collection::{Collection, CollectionStatus};
use woza_core::models::session::{Permission, Role, Session};
use woza_core::rates::RateTable;
use woza_db::CollectionFilter;

use crate::error::{Result, ServiceError};
use crate::WozaService;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// All matching collections, rejected ones included
    pub collection_count: usize,
    pub total_weight_kg: f64,
    pub total_value: f64,
    pub average_weight_kg: f64,
    pub average_value: f64,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub completed: usize,
    pub impact: ImpactResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub period: String,
    pub collection_count: usize,
    pub total_weight_kg: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub collector_id: Uuid,
    pub collection_count: usize,
    pub total_weight_kg: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialShare {
    pub material_id: String,
    pub weight_kg: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub trend: Vec<TrendPoint>,
    pub materials: Vec<MaterialShare>,
}

fn counts_toward_totals(c: &Collection) -> bool {
    c.status != CollectionStatus::Rejected
}

// ===== Reducers =====

pub fn reduce_stats(collections: &[Collection], calc: &ImpactCalculator<'_>) -> DashboardStats {
    let mut stats = DashboardStats {
        collection_count: collections.len(),
        ..DashboardStats::default()
    };

    let mut items = Vec::new();
    let mut included = 0usize;
    for c in collections {
        match c.status {
            CollectionStatus::Pending => stats.pending += 1,
            CollectionStatus::Approved => stats.approved += 1,
            CollectionStatus::Rejected => stats.rejected += 1,
            CollectionStatus::Completed => stats.completed += 1,
        }
        // Incomplete parents are counted but not averaged
        if counts_toward_totals(c) && !c.line_items.is_empty() {
            included += 1;
            items.extend_from_slice(&c.line_items);
        }
    }

    stats.impact = calc.compute_line_items(&items);
    stats.total_weight_kg = stats.impact.total_weight_kg;
    stats.total_value = stats.impact.total_value;
    if included > 0 {
        stats.average_weight_kg = stats.total_weight_kg / included as f64;
        stats.average_value = stats.total_value / included as f64;
    }
    stats
}

/// One point per month that has at least one collection, oldest first.
pub fn reduce_trend(collections: &[Collection], calc: &ImpactCalculator<'_>) -> Vec<TrendPoint> {
    let mut months: BTreeMap<String, (usize, Vec<_>)> = BTreeMap::new();
    for c in collections {
        let bucket = months.entry(c.period()).or_default();
        bucket.0 += 1;
        if counts_toward_totals(c) {
            bucket.1.extend_from_slice(&c.line_items);
        }
    }

    months
        .into_iter()
        .map(|(period, (count, items))| {
            let impact = calc.compute_line_items(&items);
            TrendPoint {
                period,
                collection_count: count,
                total_weight_kg: impact.total_weight_kg,
                total_value: impact.total_value,
            }
        })
        .collect()
}

/// Ranked by collected weight, heaviest first; ties go to the lower id.
pub fn reduce_leaderboard(
    collections: &[Collection],
    calc: &ImpactCalculator<'_>,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    let mut per_collector: HashMap<Uuid, (usize, Vec<_>)> = HashMap::new();
    for c in collections.iter().filter(|c| counts_toward_totals(c)) {
        let bucket = per_collector.entry(c.collector_id).or_default();
        bucket.0 += 1;
        bucket.1.extend_from_slice(&c.line_items);
    }

    let mut board: Vec<LeaderboardEntry> = per_collector
        .into_iter()
        .map(|(collector_id, (count, items))| {
            let impact = calc.compute_line_items(&items);
            LeaderboardEntry {
                collector_id,
                collection_count: count,
                total_weight_kg: impact.total_weight_kg,
                total_value: impact.total_value,
            }
        })
        .collect();

    board.sort_by(|a, b| {
        b.total_weight_kg
            .total_cmp(&a.total_weight_kg)
            .then_with(|| a.collector_id.cmp(&b.collector_id))
    });
    board.truncate(limit);
    board
}

pub fn reduce_materials(collections: &[Collection]) -> Vec<MaterialShare> {
    let mut per_material: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for c in collections.iter().filter(|c| counts_toward_totals(c)) {
        for item in &c.line_items {
            if !item.weight_kg.is_finite() || item.weight_kg <= 0.0 {
                continue;
            }
            let share = per_material.entry(item.material_id.as_str()).or_default();
            share.0 += item.weight_kg;
            share.1 += item.line_value();
        }
    }

    let mut shares: Vec<MaterialShare> = per_material
        .into_iter()
        .map(|(id, (weight_kg, value))| MaterialShare {
            material_id: id.to_string(),
            weight_kg,
            value,
        })
        .collect();

    // BTreeMap order already breaks ties by id; the sort is stable
    shares.sort_by(|a, b| b.weight_kg.total_cmp(&a.weight_kg));
    shares
}

// ===== Service operations =====

impl WozaService {
    /// Narrows `filter` to what the session may see.
    ///
    /// Collectors and customers are pinned to their own id. Asking for
    /// someone else's records is refused rather than silently rewritten.
    pub fn scope_filter(&self, session: &Session, filter: &CollectionFilter) -> Result<CollectionFilter> {
        let mut scoped = filter.clone();
        match session.role {
            Role::Admin => {
                session.require(Permission::ViewAllCollections)?;
            }
            Role::Collector => {
                session.require(Permission::ViewOwnCollections)?;
                if filter.collector_id.is_some_and(|id| id != session.user_id) {
                    return Err(forbidden_all(session));
                }
                scoped.collector_id = Some(session.user_id);
            }
            Role::Customer => {
                session.require(Permission::ViewOwnCollections)?;
                if filter.customer_id.is_some_and(|id| id != session.user_id) {
                    return Err(forbidden_all(session));
                }
                scoped.customer_id = Some(session.user_id);
            }
        }
        Ok(scoped)
    }

    pub async fn list_collections(&self, session: &Session, filter: &CollectionFilter) -> Result<Vec<Collection>> {
        let scoped = self.scope_filter(session, filter)?;
        Ok(self.store.list_collections(&scoped).await?)
    }

    /// Records the session may not see are reported as missing.
    pub async fn get_collection(&self, session: &Session, id: Uuid) -> Result<Collection> {
        session.require(Permission::ViewOwnCollections)?;

        self.store
            .get_collection(id)
            .await?
            .filter(|c| session.can_view(c.collector_id, c.customer_id))
            .ok_or_else(|| ServiceError::NotFound(format!("collection {}", id)))
    }

    pub async fn dashboard_stats(&self, session: &Session, filter: &CollectionFilter) -> Result<DashboardStats> {
        let collections = self.aggregate_input(session, filter).await?;
        let rates = self.history_rates().await?;
        Ok(reduce_stats(&collections, &self.calculator(&rates)))
    }

    pub async fn monthly_trend(&self, session: &Session, filter: &CollectionFilter) -> Result<Vec<TrendPoint>> {
        let collections = self.aggregate_input(session, filter).await?;
        let rates = self.history_rates().await?;
        Ok(reduce_trend(&collections, &self.calculator(&rates)))
    }

    /// Compares collectors against each other, so it is office-only.
    pub async fn collector_leaderboard(
        &self,
        session: &Session,
        filter: &CollectionFilter,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        session.require(Permission::ViewAllCollections)?;
        let collections = self.aggregate_input(session, filter).await?;
        let rates = self.history_rates().await?;
        Ok(reduce_leaderboard(&collections, &self.calculator(&rates), limit))
    }

    pub async fn material_breakdown(&self, session: &Session, filter: &CollectionFilter) -> Result<Vec<MaterialShare>> {
        let collections = self.aggregate_input(session, filter).await?;
        Ok(reduce_materials(&collections))
    }

    /// Everything the landing dashboard shows, read concurrently.
    pub async fn dashboard_overview(&self, session: &Session, filter: &CollectionFilter) -> Result<DashboardOverview> {
        let (stats, trend, materials) = tokio::try_join!(
            self.dashboard_stats(session, filter),
            self.monthly_trend(session, filter),
            self.material_breakdown(session, filter),
        )?;
        Ok(DashboardOverview { stats, trend, materials })
    }

    async fn aggregate_input(&self, session: &Session, filter: &CollectionFilter) -> Result<Vec<Collection>> {
        let scoped = self.scope_filter(session, &filter.unpaged())?;
        Ok(self.store.list_collections(&scoped).await?)
    }

    /// Coefficients for every catalogue entry, deactivated ones included,
    /// since historical line items may still reference them.
    async fn history_rates(&self) -> Result<RateTable> {
        let materials = self.store.list_materials(true).await?;
        let mut rates = RateTable::new();
        for m in &materials {
            rates.insert(&m.id, m.rate());
        }
        Ok(rates)
    }
}

fn forbidden_all(session: &Session) -> ServiceError {
    woza_core::Error::Forbidden {
        role: session.role,
        permission: Permission::ViewAllCollections,
    }
    .into()
}
