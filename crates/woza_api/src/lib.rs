pub mod error;
pub mod handlers;
pub mod routes;
pub mod session;

use woza_service::WozaService;

#[derive(Clone)]
pub struct AppState {
    pub service: WozaService,
}

impl AppState {
    pub fn new(service: WozaService) -> Self {
        Self { service }
    }
}

pub use routes::app_router;
