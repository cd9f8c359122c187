use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{debug, error, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::{today_in, weekly_occurrences};

use crate::models::{
    CalendarEvent, ClinicCalendarDay, DayMutationOutcome, DoctorCalendarDay,
    DoctorWeeklyScheduleRequest, ScheduleBatchOutcome, ScheduleError, SkippedDate,
    UpdateDoctorDayRequest,
};
use crate::services::guard::{BookingGuard, ConflictScope};
use crate::services::slots::generate_day_slots;
use crate::services::validation;
use crate::store::CalendarStore;

const STORE_FAILURE_REASON: &str = "temporary storage failure, please retry this date";

/// Maintains doctor-level working days. Each applied day must nest
/// inside the clinic's open hours on the same date, and every applied
/// day gets its bookable slots fully regenerated.
pub struct DoctorCalendarService {
    store: CalendarStore,
    guard: BookingGuard,
    timezone: Tz,
}

impl DoctorCalendarService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)), config.timezone())
    }

    pub fn with_client(supabase: Arc<SupabaseClient>, timezone: Tz) -> Self {
        Self {
            store: CalendarStore::new(supabase.clone()),
            guard: BookingGuard::new(supabase),
            timezone,
        }
    }

    /// Apply a weekly recurrence of working days for a doctor at one
    /// clinic. Outcomes are collected sequentially for every concrete
    /// date before the response is produced; one date's failure never
    /// rolls back or aborts its siblings.
    pub async fn add_weekly_schedule(
        &self,
        doctor_id: Uuid,
        request: DoctorWeeklyScheduleRequest,
        auth_token: &str,
    ) -> Result<ScheduleBatchOutcome, ScheduleError> {
        debug!("Applying weekly doctor schedule for doctor {}", doctor_id);

        let checked = validation::validate_doctor_schedule(&request);
        if checked.has_error {
            return Err(ScheduleError::Validation(checked.field_errors));
        }

        if !self
            .store
            .has_affiliation(doctor_id, request.clinic_id, Some(auth_token))
            .await?
        {
            let mut field_errors = std::collections::BTreeMap::new();
            field_errors.insert(
                "clinic_id".to_string(),
                "doctor is not affiliated with this clinic".to_string(),
            );
            return Err(ScheduleError::Validation(field_errors));
        }

        let today = today_in(self.timezone);
        let mut weekdays = request.weekdays.clone();
        weekdays.sort_unstable();
        weekdays.dedup();

        let mut outcome = ScheduleBatchOutcome::default();

        for weekday in weekdays {
            for date in weekly_occurrences(weekday, today, request.recurrence_weeks) {
                self.apply_single_date(doctor_id, date, &request, auth_token, &mut outcome)
                    .await;
            }
        }

        outcome.applied_dates.sort_unstable();
        outcome.skipped.sort_by_key(|s| s.date);
        Ok(outcome)
    }

    async fn apply_single_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        request: &DoctorWeeklyScheduleRequest,
        auth_token: &str,
        outcome: &mut ScheduleBatchOutcome,
    ) {
        let clinic_day = match self
            .store
            .get_clinic_day(request.clinic_id, date, Some(auth_token))
            .await
        {
            Ok(Some(day)) if day.is_open => day,
            Ok(_) => {
                outcome.skipped.push(SkippedDate {
                    date,
                    reason: format!("clinic not open on {}", date),
                });
                return;
            }
            Err(e) => {
                error!("Clinic day lookup failed for {}: {}", date, e);
                outcome.skipped.push(SkippedDate { date, reason: STORE_FAILURE_REASON.to_string() });
                return;
            }
        };

        if let Some(reason) = nesting_violation(&clinic_day, request) {
            outcome.skipped.push(SkippedDate { date, reason });
            return;
        }

        let scope = ConflictScope::DoctorDay { doctor_id, date };
        match self.guard.has_booked_conflict(&scope, Some(auth_token)).await {
            Ok(true) => {
                outcome.skipped.push(SkippedDate {
                    date,
                    reason: format!("appointments already scheduled on {}", date),
                });
                return;
            }
            Ok(false) => {}
            Err(e) => {
                error!("Guard check failed for {}: {}", date, e);
                outcome.skipped.push(SkippedDate { date, reason: STORE_FAILURE_REASON.to_string() });
                return;
            }
        }

        let day = match self
            .store
            .upsert_doctor_day(
                doctor_id,
                &clinic_day,
                request.start_time,
                request.end_time,
                Some(auth_token),
            )
            .await
        {
            Ok(day) => day,
            Err(e) => {
                error!("Failed to upsert doctor day {}: {}", date, e);
                outcome.skipped.push(SkippedDate { date, reason: STORE_FAILURE_REASON.to_string() });
                return;
            }
        };

        let lunch = request.lunch_start.zip(request.lunch_end);
        let slots = generate_day_slots(
            request.start_time,
            request.end_time,
            lunch,
            request.slot_duration_minutes,
        );
        if slots.is_empty() {
            warn!("Schedule for {} produces no bookable slots", date);
        }

        match self.store.replace_slots(&day, &slots, Some(auth_token)).await {
            Ok(()) => outcome.applied_dates.push(date),
            Err(ScheduleError::Conflict(reason)) => {
                outcome.skipped.push(SkippedDate { date, reason });
            }
            Err(e) => {
                error!("Failed to regenerate slots for {}: {}", date, e);
                outcome.skipped.push(SkippedDate { date, reason: STORE_FAILURE_REASON.to_string() });
            }
        }
    }

    /// Overwrite one working day's hours and regenerate its slots,
    /// re-checking the nesting invariant against the clinic day on
    /// record and the booking barrier.
    pub async fn update_single_day(
        &self,
        doctor_id: Uuid,
        schedule_id: Uuid,
        request: UpdateDoctorDayRequest,
        auth_token: &str,
    ) -> Result<DayMutationOutcome, ScheduleError> {
        let checked = validation::validate_doctor_day_update(&request);
        if checked.has_error {
            return Err(ScheduleError::Validation(checked.field_errors));
        }

        let day = self
            .store
            .get_doctor_day(doctor_id, schedule_id, Some(auth_token))
            .await?
            .ok_or_else(|| {
                ScheduleError::NotFound(format!("Schedule {} not found for this doctor", schedule_id))
            })?;

        let clinic_day = self
            .store
            .get_clinic_day_by_id(day.clinic_schedule_id, Some(auth_token))
            .await?;
        let clinic_day = match clinic_day {
            Some(cd) if cd.is_open => cd,
            _ => {
                return Ok(DayMutationOutcome::blocked(format!(
                    "clinic not open on {}",
                    day.date
                )))
            }
        };

        if request.start_time < clinic_day.opening_time
            || request.end_time > clinic_day.closing_time
        {
            return Ok(DayMutationOutcome::blocked(format!(
                "doctor hours {}-{} fall outside clinic hours {}-{} on {}",
                request.start_time.format("%H:%M"),
                request.end_time.format("%H:%M"),
                clinic_day.opening_time.format("%H:%M"),
                clinic_day.closing_time.format("%H:%M"),
                day.date
            )));
        }

        let scope = ConflictScope::DoctorDay { doctor_id, date: day.date };
        if self.guard.has_booked_conflict(&scope, Some(auth_token)).await? {
            return Ok(DayMutationOutcome::blocked(format!(
                "appointments already scheduled on {}",
                day.date
            )));
        }

        self.store
            .update_doctor_day_hours(schedule_id, request.start_time, request.end_time, Some(auth_token))
            .await?;

        let updated = DoctorCalendarDay {
            start_time: request.start_time,
            end_time: request.end_time,
            ..day
        };
        let lunch = request.lunch_start.zip(request.lunch_end);
        let slots = generate_day_slots(
            request.start_time,
            request.end_time,
            lunch,
            request.slot_duration_minutes,
        );
        self.store.replace_slots(&updated, &slots, Some(auth_token)).await?;

        Ok(DayMutationOutcome::applied())
    }

    /// Delete one working day and its slots; blocked while any slot
    /// of that day is booked.
    pub async fn delete_single_day(
        &self,
        doctor_id: Uuid,
        schedule_id: Uuid,
        auth_token: &str,
    ) -> Result<DayMutationOutcome, ScheduleError> {
        let day = self
            .store
            .get_doctor_day(doctor_id, schedule_id, Some(auth_token))
            .await?
            .ok_or_else(|| {
                ScheduleError::NotFound(format!("Schedule {} not found for this doctor", schedule_id))
            })?;

        let scope = ConflictScope::DoctorDay { doctor_id, date: day.date };
        if self.guard.has_booked_conflict(&scope, Some(auth_token)).await? {
            return Ok(DayMutationOutcome::blocked(format!(
                "appointments already scheduled on {}",
                day.date
            )));
        }

        self.store.delete_doctor_day(&day, Some(auth_token)).await?;
        Ok(DayMutationOutcome::applied())
    }

    /// Calendar feed combining working-day blocks and slot blocks;
    /// booked slots are colored red. Pure read projection.
    pub async fn build_calendar_view(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<CalendarEvent>, ScheduleError> {
        let days = self.store.list_doctor_days(doctor_id, auth_token).await?;
        let slots = self.store.list_doctor_slots(doctor_id, auth_token).await?;

        let mut events: Vec<CalendarEvent> = Vec::with_capacity(days.len() + slots.len());

        for day in days {
            events.push(CalendarEvent {
                title: format!(
                    "Work from {} to {}",
                    day.start_time.format("%H:%M"),
                    day.end_time.format("%H:%M")
                ),
                start: day.date.to_string(),
                end: None,
                color: None,
            });
        }

        for slot in slots {
            events.push(CalendarEvent {
                title: "Appointment".to_string(),
                start: format!("{}T{}", slot.slot_date, slot.start_time.format("%H:%M:%S")),
                end: Some(format!("{}T{}", slot.slot_date, slot.end_time.format("%H:%M:%S"))),
                color: slot.is_booked.then(|| "red".to_string()),
            });
        }

        events.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(events)
    }
}

fn nesting_violation(
    clinic_day: &ClinicCalendarDay,
    request: &DoctorWeeklyScheduleRequest,
) -> Option<String> {
    if request.start_time < clinic_day.opening_time || request.end_time > clinic_day.closing_time {
        return Some(format!(
            "doctor hours {}-{} fall outside clinic hours {}-{} on {}",
            request.start_time.format("%H:%M"),
            request.end_time.format("%H:%M"),
            clinic_day.opening_time.format("%H:%M"),
            clinic_day.closing_time.format("%H:%M"),
            clinic_day.date
        ));
    }
    None
}
