use std::collections::BTreeMap;

use chrono::NaiveTime;

use crate::models::{
    ClinicWeeklyScheduleRequest, DoctorWeeklyScheduleRequest, UpdateClinicDayRequest,
    UpdateDoctorDayRequest,
};

/// Outcome of a pure structural check, run before any store access.
/// A request failing here produces no partial effect.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub has_error: bool,
    pub field_errors: BTreeMap<String, String>,
}

impl ValidationOutcome {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.has_error = true;
        self.field_errors.entry(field.to_string()).or_insert_with(|| message.into());
    }
}

pub fn validate_clinic_schedule(request: &ClinicWeeklyScheduleRequest) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    check_weekdays(&mut outcome, &request.weekdays);
    check_ordering(&mut outcome, "opening_time", request.opening_time, request.closing_time);
    check_recurrence(&mut outcome, request.recurrence_weeks);

    outcome
}

pub fn validate_clinic_day_update(request: &UpdateClinicDayRequest) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();
    check_ordering(&mut outcome, "opening_time", request.opening_time, request.closing_time);
    outcome
}

pub fn validate_doctor_schedule(request: &DoctorWeeklyScheduleRequest) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    check_weekdays(&mut outcome, &request.weekdays);
    check_ordering(&mut outcome, "start_time", request.start_time, request.end_time);
    check_recurrence(&mut outcome, request.recurrence_weeks);
    check_duration(&mut outcome, request.slot_duration_minutes);
    check_lunch(
        &mut outcome,
        request.lunch_start,
        request.lunch_end,
        request.start_time,
        request.end_time,
    );

    outcome
}

pub fn validate_doctor_day_update(request: &UpdateDoctorDayRequest) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    check_ordering(&mut outcome, "start_time", request.start_time, request.end_time);
    check_duration(&mut outcome, request.slot_duration_minutes);
    check_lunch(
        &mut outcome,
        request.lunch_start,
        request.lunch_end,
        request.start_time,
        request.end_time,
    );

    outcome
}

fn check_weekdays(outcome: &mut ValidationOutcome, weekdays: &[u32]) {
    if weekdays.is_empty() {
        outcome.push("weekdays", "at least one weekday must be selected");
        return;
    }
    if weekdays.iter().any(|&d| d > 6) {
        outcome.push("weekdays", "weekdays must be between 0 (Sunday) and 6 (Saturday)");
    }
}

fn check_ordering(outcome: &mut ValidationOutcome, start_field: &str, start: NaiveTime, end: NaiveTime) {
    if start >= end {
        outcome.push(start_field, "start time must be strictly before end time");
    }
}

fn check_recurrence(outcome: &mut ValidationOutcome, weeks: u32) {
    if weeks == 0 {
        outcome.push("recurrence_weeks", "recurrence must cover at least one week");
    }
}

fn check_duration(outcome: &mut ValidationOutcome, duration_minutes: i32) {
    if duration_minutes <= 0 {
        outcome.push("slot_duration_minutes", "slot duration must be a positive number of minutes");
    }
}

fn check_lunch(
    outcome: &mut ValidationOutcome,
    lunch_start: Option<NaiveTime>,
    lunch_end: Option<NaiveTime>,
    start: NaiveTime,
    end: NaiveTime,
) {
    match (lunch_start, lunch_end) {
        (None, None) => {}
        (Some(ls), Some(le)) => {
            if ls >= le {
                outcome.push("lunch_start", "lunch start must be strictly before lunch end");
            } else if ls < start || le > end {
                outcome.push("lunch_start", "lunch break must lie within the working hours");
            }
        }
        _ => {
            outcome.push("lunch_start", "lunch start and lunch end must be provided together");
        }
    }
}
