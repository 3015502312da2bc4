use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use woza_core::models::collection::{Collection, CollectionDraft};
use woza_db::CollectionFilter;
use woza_service::photos::PhotoRef;
use woza_service::submission::{Preview, SubmissionReceipt};

use crate::error::ApiError;
use crate::session::CurrentSession;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

pub async fn submit_collection(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(draft): Json<CollectionDraft>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), ApiError> {
    let receipt = state.service.submit_collection(&session, draft).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn preview_collection(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(draft): Json<CollectionDraft>,
) -> Result<Json<Preview>, ApiError> {
    let preview = state.service.preview_collection(&session, &draft).await?;
    Ok(Json(preview))
}

pub async fn list_collections(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<CollectionFilter>,
) -> Result<Json<Vec<Collection>>, ApiError> {
    let collections = state.service.list_collections(&session, &filter).await?;
    Ok(Json(collections))
}

pub async fn get_collection(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Collection>, ApiError> {
    let collection = state.service.get_collection(&session, id).await?;
    Ok(Json(collection))
}

pub async fn approve_collection(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Collection>, ApiError> {
    Ok(Json(state.service.approve_collection(&session, id).await?))
}

pub async fn reject_collection(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequest>,
) -> Result<Json<Collection>, ApiError> {
    Ok(Json(state.service.reject_collection(&session, id, &request.reason).await?))
}

pub async fn complete_collection(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Collection>, ApiError> {
    Ok(Json(state.service.complete_collection(&session, id).await?))
}

/// Raw image body; the Content-Type header decides the stored format.
pub async fn upload_photo(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<PhotoRef>), ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let photo = state
        .service
        .upload_photo(&session, body.to_vec(), content_type)
        .await?;
    Ok((StatusCode::CREATED, Json(photo)))
}
