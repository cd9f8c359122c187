use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::{today_in, weekly_occurrences};

use crate::models::{
    ClinicWeeklyScheduleRequest, DayMutationOutcome, OpenClinicDay, ScheduleBatchOutcome,
    ScheduleError, SkippedDate, UpdateClinicDayRequest,
};
use crate::services::guard::{BookingGuard, ConflictScope};
use crate::services::validation;
use crate::store::CalendarStore;

const STORE_FAILURE_REASON: &str = "temporary storage failure, please retry this date";

/// Maintains clinic-level open/closed days. Every destructive write
/// runs behind the booking guard; failures are isolated per concrete
/// date, never fatal to the rest of a batch.
pub struct ClinicCalendarService {
    store: CalendarStore,
    guard: BookingGuard,
    timezone: Tz,
}

impl ClinicCalendarService {
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

    /// Apply a weekly recurrence: for each selected weekday, the next
    /// `recurrence_weeks` concrete dates are upserted as open days
    /// with the given hours. Dates with booked appointments are
    /// skipped with a reason instead of failing the batch.
    pub async fn add_weekly_schedule(
        &self,
        clinic_id: Uuid,
        request: ClinicWeeklyScheduleRequest,
        auth_token: &str,
    ) -> Result<ScheduleBatchOutcome, ScheduleError> {
        debug!("Applying weekly clinic schedule for clinic {}", clinic_id);

        let checked = validation::validate_clinic_schedule(&request);
        if checked.has_error {
            return Err(ScheduleError::Validation(checked.field_errors));
        }

        if !self.store.clinic_exists(clinic_id, Some(auth_token)).await? {
            return Err(ScheduleError::NotFound(format!("Clinic {} not found", clinic_id)));
        }

        let today = today_in(self.timezone);
        let mut weekdays = request.weekdays.clone();
        weekdays.sort_unstable();
        weekdays.dedup();

        let mut outcome = ScheduleBatchOutcome::default();

        for weekday in weekdays {
            for date in weekly_occurrences(weekday, today, request.recurrence_weeks) {
                self.apply_single_date(clinic_id, date, &request, auth_token, &mut outcome)
                    .await;
            }
        }

        outcome.applied_dates.sort_unstable();
        outcome.skipped.sort_by_key(|s| s.date);
        Ok(outcome)
    }

    async fn apply_single_date(
        &self,
        clinic_id: Uuid,
        date: NaiveDate,
        request: &ClinicWeeklyScheduleRequest,
        auth_token: &str,
        outcome: &mut ScheduleBatchOutcome,
    ) {
        let scope = ConflictScope::ClinicDay { clinic_id, date };
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

        match self
            .store
            .upsert_clinic_day(
                clinic_id,
                date,
                request.opening_time,
                request.closing_time,
                Some(auth_token),
            )
            .await
        {
            Ok(_) => outcome.applied_dates.push(date),
            Err(e) => {
                error!("Failed to upsert clinic day {}: {}", date, e);
                outcome.skipped.push(SkippedDate { date, reason: STORE_FAILURE_REASON.to_string() });
            }
        }
    }

    /// Overwrite one day's hours, unless a booked appointment blocks it.
    pub async fn update_single_day(
        &self,
        clinic_id: Uuid,
        schedule_id: Uuid,
        request: UpdateClinicDayRequest,
        auth_token: &str,
    ) -> Result<DayMutationOutcome, ScheduleError> {
        let checked = validation::validate_clinic_day_update(&request);
        if checked.has_error {
            return Err(ScheduleError::Validation(checked.field_errors));
        }

        let day = self
            .store
            .get_clinic_day_by_id(schedule_id, Some(auth_token))
            .await?
            .filter(|d| d.clinic_id == clinic_id)
            .ok_or_else(|| {
                ScheduleError::NotFound(format!("Schedule {} not found for this clinic", schedule_id))
            })?;

        let scope = ConflictScope::ClinicDay { clinic_id, date: day.date };
        if self.guard.has_booked_conflict(&scope, Some(auth_token)).await? {
            return Ok(DayMutationOutcome::blocked(format!(
                "appointments already scheduled on {}",
                day.date
            )));
        }

        self.store
            .update_clinic_day_hours(schedule_id, request.opening_time, request.closing_time, Some(auth_token))
            .await?;
        Ok(DayMutationOutcome::applied())
    }

    /// Soft-close one day (row retained for history), unless blocked.
    pub async fn close_single_day(
        &self,
        clinic_id: Uuid,
        schedule_id: Uuid,
        auth_token: &str,
    ) -> Result<DayMutationOutcome, ScheduleError> {
        let day = self
            .store
            .get_clinic_day_by_id(schedule_id, Some(auth_token))
            .await?
            .filter(|d| d.clinic_id == clinic_id)
            .ok_or_else(|| {
                ScheduleError::NotFound(format!("Schedule {} not found for this clinic", schedule_id))
            })?;

        let scope = ConflictScope::ClinicDay { clinic_id, date: day.date };
        if self.guard.has_booked_conflict(&scope, Some(auth_token)).await? {
            return Ok(DayMutationOutcome::blocked(format!(
                "appointments already scheduled on {}",
                day.date
            )));
        }

        self.store.soft_close_clinic_day(schedule_id, Some(auth_token)).await?;
        Ok(DayMutationOutcome::applied())
    }

    /// Read-only projection, no guard involved.
    pub async fn list_open_days_in_range(
        &self,
        clinic_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<OpenClinicDay>, ScheduleError> {
        let days = self.store.list_open_days(clinic_id, from, to, auth_token).await?;
        Ok(days
            .into_iter()
            .map(|day| OpenClinicDay {
                date: day.date,
                weekday: day.day_of_week,
                opening_time: day.opening_time,
                closing_time: day.closing_time,
            })
            .collect())
    }
}
