use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    ClinicWeeklyScheduleRequest, DayMutationOutcome, DoctorWeeklyScheduleRequest,
    ScheduleBatchOutcome, UpdateClinicDayRequest, UpdateDoctorDayRequest,
};
use crate::services::{clinic_calendar::ClinicCalendarService, doctor_calendar::DoctorCalendarService};

#[derive(Debug, Deserialize)]
pub struct OpenDaysQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

// ==============================================================================
// CLINIC CALENDAR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn add_clinic_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(clinic_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<ClinicWeeklyScheduleRequest>,
) -> Result<Json<ScheduleBatchOutcome>, AppError> {
    let service = ClinicCalendarService::new(&state);
    let outcome = service
        .add_weekly_schedule(clinic_id, request, auth.token())
        .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn update_clinic_day(
    State(state): State<Arc<AppConfig>>,
    Path((clinic_id, schedule_id)): Path<(Uuid, Uuid)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateClinicDayRequest>,
) -> Result<Json<DayMutationOutcome>, AppError> {
    let service = ClinicCalendarService::new(&state);
    let outcome = service
        .update_single_day(clinic_id, schedule_id, request, auth.token())
        .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn close_clinic_day(
    State(state): State<Arc<AppConfig>>,
    Path((clinic_id, schedule_id)): Path<(Uuid, Uuid)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<DayMutationOutcome>, AppError> {
    let service = ClinicCalendarService::new(&state);
    let outcome = service
        .close_single_day(clinic_id, schedule_id, auth.token())
        .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn list_open_clinic_days(
    State(state): State<Arc<AppConfig>>,
    Path(clinic_id): Path<Uuid>,
    Query(query): Query<OpenDaysQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ClinicCalendarService::new(&state);
    let days = service
        .list_open_days_in_range(clinic_id, query.from, query.to, None)
        .await?;
    Ok(Json(json!({
        "clinic_id": clinic_id,
        "open_days": days,
    })))
}

// ==============================================================================
// DOCTOR CALENDAR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn add_doctor_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<DoctorWeeklyScheduleRequest>,
) -> Result<Json<ScheduleBatchOutcome>, AppError> {
    let service = DoctorCalendarService::new(&state);
    let outcome = service
        .add_weekly_schedule(doctor_id, request, auth.token())
        .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn update_doctor_day(
    State(state): State<Arc<AppConfig>>,
    Path((doctor_id, schedule_id)): Path<(Uuid, Uuid)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateDoctorDayRequest>,
) -> Result<Json<DayMutationOutcome>, AppError> {
    let service = DoctorCalendarService::new(&state);
    let outcome = service
        .update_single_day(doctor_id, schedule_id, request, auth.token())
        .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn delete_doctor_day(
    State(state): State<Arc<AppConfig>>,
    Path((doctor_id, schedule_id)): Path<(Uuid, Uuid)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<DayMutationOutcome>, AppError> {
    let service = DoctorCalendarService::new(&state);
    let outcome = service
        .delete_single_day(doctor_id, schedule_id, auth.token())
        .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn doctor_calendar_view(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorCalendarService::new(&state);
    let events = service.build_calendar_view(doctor_id, None).await?;
    Ok(Json(json!({
        "doctor_id": doctor_id,
        "events": events,
    })))
}
