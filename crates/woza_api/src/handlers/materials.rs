use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use woza_core::models::material::Material;
use woza_service::materials::MaterialUpdate;

use crate::error::ApiError;
use crate::session::CurrentSession;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    pub include_inactive: bool,
}

pub async fn list_materials(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Material>>, ApiError> {
    let materials = state
        .service
        .list_materials(&session, params.include_inactive)
        .await?;
    Ok(Json(materials))
}

pub async fn create_material(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(material): Json<Material>,
) -> Result<(StatusCode, Json<Material>), ApiError> {
    let created = state.service.create_material(&session, material).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_material(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(update): Json<MaterialUpdate>,
) -> Result<Json<Material>, ApiError> {
    let updated = state.service.update_material(&session, &id, update).await?;
    Ok(Json(updated))
}

/// Soft delete: the material stops being offered but history keeps it.
pub async fn deactivate_material(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.deactivate_material(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
