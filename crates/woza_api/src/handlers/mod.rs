pub mod collections;
pub mod dashboard;
pub mod impact;
pub mod materials;

use axum::Json;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
