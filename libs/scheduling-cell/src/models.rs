use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// CALENDAR ROWS
// ==============================================================================

/// One concrete open/closed day of a clinic. At most one row exists
/// per (clinic_id, date); closing a day flips `is_open` instead of
/// deleting the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicCalendarDay {
    pub schedule_id: Uuid,
    pub clinic_id: Uuid,
    pub date: NaiveDate,
    pub day_of_week: String,
    pub is_open: bool,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
}

/// One concrete working day of a doctor at a clinic. The working
/// interval must nest inside the referenced clinic day's hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorCalendarDay {
    pub schedule_id: Uuid,
    pub doctor_id: Uuid,
    pub clinic_id: Uuid,
    pub clinic_schedule_id: Uuid,
    pub date: NaiveDate,
    pub day_of_week: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

/// A bookable slot generated from a doctor day. Once `is_booked` is
/// true the slot and its owning day are a hard mutation barrier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSlot {
    pub slot_id: Uuid,
    pub doctor_id: Uuid,
    pub clinic_id: Uuid,
    pub doctor_day_id: Uuid,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_booked: bool,
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicWeeklyScheduleRequest {
    /// Sunday-based weekday numbers, 0..=6.
    pub weekdays: Vec<u32>,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub recurrence_weeks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateClinicDayRequest {
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorWeeklyScheduleRequest {
    pub clinic_id: Uuid,
    pub weekdays: Vec<u32>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub lunch_start: Option<NaiveTime>,
    pub lunch_end: Option<NaiveTime>,
    pub slot_duration_minutes: i32,
    pub recurrence_weeks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDoctorDayRequest {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub lunch_start: Option<NaiveTime>,
    pub lunch_end: Option<NaiveTime>,
    pub slot_duration_minutes: i32,
}

// ==============================================================================
// OUTCOMES
// ==============================================================================

/// Result of a multi-date schedule submission. The unit of atomicity
/// is one concrete date: callers always get the complete picture of
/// what was applied and what was skipped, never an opaque failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleBatchOutcome {
    pub applied_dates: Vec<NaiveDate>,
    pub skipped: Vec<SkippedDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedDate {
    pub date: NaiveDate,
    pub reason: String,
}

/// Result of a single-day mutation: `{ok: true}` or
/// `{ok: false, reason}` when the booking barrier blocked it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayMutationOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DayMutationOutcome {
    pub fn applied() -> Self {
        Self { ok: true, reason: None }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self { ok: false, reason: Some(reason.into()) }
    }
}

/// Read projection of a clinic's open days in a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenClinicDay {
    pub date: NaiveDate,
    pub weekday: String,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
}

/// Display event for the doctor's calendar feed: full-day working
/// blocks and timed slot blocks, booked slots colored red.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScheduleError {
    #[error("Validation failed")]
    Validation(BTreeMap<String, String>),

    #[error("{0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Store(String),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Validation(field_errors) => AppError::Validation(field_errors),
            ScheduleError::NotFound(msg) => AppError::NotFound(msg),
            ScheduleError::Conflict(msg) => AppError::Conflict(msg),
            ScheduleError::Store(msg) => AppError::Database(msg),
        }
    }
}
