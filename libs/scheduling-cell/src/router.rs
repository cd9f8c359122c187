use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn clinic_calendar_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/{clinic_id}/calendar",
            post(handlers::add_clinic_schedule).get(handlers::list_open_clinic_days),
        )
        .route(
            "/{clinic_id}/calendar/{schedule_id}",
            put(handlers::update_clinic_day).delete(handlers::close_clinic_day),
        )
        .with_state(state)
}

pub fn doctor_calendar_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/{doctor_id}/calendar", post(handlers::add_doctor_schedule))
        .route(
            "/{doctor_id}/calendar/{schedule_id}",
            put(handlers::update_doctor_day).delete(handlers::delete_doctor_day),
        )
        .route("/{doctor_id}/calendar-view", get(handlers::doctor_calendar_view))
        .with_state(state)
}
