use std::sync::Arc;

use axum::{routing::get, Router};

use scheduling_cell::router::{clinic_calendar_routes, doctor_calendar_routes};
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Pulse Clinic API is running!" }))
        .nest("/clinics", clinic_calendar_routes(state.clone()))
        .nest("/doctors", doctor_calendar_routes(state))
}
