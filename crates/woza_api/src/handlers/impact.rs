use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use woza_core::{ImpactEntry, ImpactResult};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ImpactRequest {
    #[serde(default)]
    pub entries: Vec<ImpactEntry>,
}

/// Live totals for the submission form. Needs no session.
pub async fn compute_impact(
    State(state): State<AppState>,
    Json(request): Json<ImpactRequest>,
) -> Result<Json<ImpactResult>, ApiError> {
    let result = state.service.compute_impact(&request.entries).await?;
    Ok(Json(result))
}
