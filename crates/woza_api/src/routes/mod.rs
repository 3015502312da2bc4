use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{collections, dashboard, health_check, impact, materials};
use crate::AppState;

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/impact", post(impact::compute_impact))
        .route(
            "/materials",
            get(materials::list_materials).post(materials::create_material),
        )
        .route(
            "/materials/:id",
            put(materials::update_material).delete(materials::deactivate_material),
        )
        .route(
            "/collections",
            get(collections::list_collections).post(collections::submit_collection),
        )
        .route("/collections/preview", post(collections::preview_collection))
        .route("/collections/:id", get(collections::get_collection))
        .route("/collections/:id/approve", post(collections::approve_collection))
        .route("/collections/:id/reject", post(collections::reject_collection))
        .route("/collections/:id/complete", post(collections::complete_collection))
        .route("/photos", post(collections::upload_photo))
        .route("/dashboard", get(dashboard::overview))
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/trend", get(dashboard::trend))
        .route("/dashboard/leaderboard", get(dashboard::leaderboard))
        .route("/dashboard/materials", get(dashboard::materials))
        .with_state(state)
}
