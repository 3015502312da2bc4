use axum::extract::{Query, State};
use axum::Json;

use woza_db::CollectionFilter;
use woza_service::dashboard::{DashboardOverview, DashboardStats, LeaderboardEntry, MaterialShare, TrendPoint};

use crate::error::ApiError;
use crate::session::CurrentSession;
use crate::AppState;

const DEFAULT_LEADERBOARD_SIZE: usize = 10;

pub async fn overview(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<CollectionFilter>,
) -> Result<Json<DashboardOverview>, ApiError> {
    Ok(Json(state.service.dashboard_overview(&session, &filter).await?))
}

pub async fn stats(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<CollectionFilter>,
) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(state.service.dashboard_stats(&session, &filter).await?))
}

pub async fn trend(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<CollectionFilter>,
) -> Result<Json<Vec<TrendPoint>>, ApiError> {
    Ok(Json(state.service.monthly_trend(&session, &filter).await?))
}

/// `limit` sizes the board; aggregation itself ignores pagination.
pub async fn leaderboard(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<CollectionFilter>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let limit = filter
        .limit
        .and_then(|l| usize::try_from(l).ok())
        .unwrap_or(DEFAULT_LEADERBOARD_SIZE);
    Ok(Json(state.service.collector_leaderboard(&session, &filter, limit).await?))
}

pub async fn materials(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<CollectionFilter>,
) -> Result<Json<Vec<MaterialShare>>, ApiError> {
    Ok(Json(state.service.material_breakdown(&session, &filter).await?))
}
