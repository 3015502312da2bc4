use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use woza_db::StoreError;
use woza_service::ServiceError;

/// Every failure a handler can return, rendered as a JSON body.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed session headers
    Unauthorized(String),
    Service(ServiceError),
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Service(e)
    }
}

pub fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Incomplete { .. } => StatusCode::MULTI_STATUS,
        ServiceError::Unreconciled(_) => StatusCode::CONFLICT,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Domain(e) => match e {
            woza_core::Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            woza_core::Error::InvalidTransition { .. } => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        },
        ServiceError::Store(e) => match e {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            e if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ServiceError::Photo(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::PhotosDisabled => StatusCode::NOT_IMPLEMENTED,
    }
}

fn code_for(error: &ServiceError) -> &'static str {
    match error {
        ServiceError::Validation(_) => "validation_failed",
        ServiceError::Incomplete { .. } => "incomplete",
        ServiceError::Unreconciled(_) => "unreconciled",
        ServiceError::NotFound(_) => "not_found",
        ServiceError::Domain(woza_core::Error::Forbidden { .. }) => "forbidden",
        ServiceError::Domain(woza_core::Error::InvalidTransition { .. }) => "invalid_transition",
        ServiceError::Domain(_) => "invalid_request",
        ServiceError::Store(e) if e.is_retryable() => "store_unavailable",
        ServiceError::Store(_) => "store_error",
        ServiceError::Photo(_) => "photo_storage_unavailable",
        ServiceError::PhotosDisabled => "photos_disabled",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = match self {
            ApiError::Unauthorized(message) => {
                let body = json!({
                    "error": { "code": "unauthorized", "message": message, "retryable": false }
                });
                return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
            }
            ApiError::Service(error) => error,
        };

        let status = status_for(&error);
        let body = match &error {
            ServiceError::Validation(findings) => json!({
                "error": {
                    "code": code_for(&error),
                    "message": error.to_string(),
                    "retryable": false,
                },
                "findings": findings,
            }),
            // The parent record exists; the client needs its id to follow up
            ServiceError::Incomplete { collection_id, .. } => json!({
                "collectionId": collection_id,
                "state": "incomplete",
                "message": error.to_string(),
            }),
            _ => json!({
                "error": {
                    "code": code_for(&error),
                    "message": error.to_string(),
                    "retryable": error.is_retryable(),
                }
            }),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %error, "request failed");
        }

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert("retry-after", HeaderValue::from_static("3"));
        }
        response
    }
}
