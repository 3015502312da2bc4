use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use uuid::Uuid;

use woza_core::models::session::{Role, Session};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The caller, as asserted by the authenticating proxy in front of the API.
pub struct CurrentSession(pub Session);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ApiError> {
    headers
        .get(name)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", name)))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized(format!("{} header is not valid text", name)))
}

pub fn session_from_headers(headers: &HeaderMap) -> Result<Session, ApiError> {
    let user_id: Uuid = header(headers, USER_ID_HEADER)?
        .trim()
        .parse()
        .map_err(|_| ApiError::Unauthorized(format!("{} must be a UUID", USER_ID_HEADER)))?;
    let role: Role = header(headers, USER_ROLE_HEADER)?
        .parse()
        .map_err(|e: woza_core::Error| ApiError::Unauthorized(e.to_string()))?;

    Ok(Session::login(user_id, role))
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_from_headers(&parts.headers).map(CurrentSession)
    }
}
