use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;
use shared_utils::weekday_name;

use crate::models::{AppointmentSlot, ClinicCalendarDay, DoctorCalendarDay, ScheduleError};
use crate::services::slots::SlotWindow;

const TIME_FORMAT: &str = "%H:%M:%S";

fn upsert_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Prefer",
        HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
    );
    headers
}

fn representation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

/// All durable-store statements the calendar managers issue. Upserts
/// are atomic insert-or-update-on-conflict keyed by the row's
/// uniqueness constraint, so concurrent identical-key writes serialize
/// at the store.
pub struct CalendarStore {
    supabase: Arc<SupabaseClient>,
}

impl CalendarStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn store_err(e: anyhow::Error) -> ScheduleError {
        ScheduleError::Store(e.to_string())
    }

    // --------------------------------------------------------------------------
    // Existence checks
    // --------------------------------------------------------------------------

    pub async fn clinic_exists(
        &self,
        clinic_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<bool, ScheduleError> {
        let path = format!("/rest/v1/clinics?clinic_id=eq.{}&select=clinic_id&limit=1", clinic_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(Self::store_err)?;
        Ok(!rows.is_empty())
    }

    pub async fn has_affiliation(
        &self,
        doctor_id: Uuid,
        clinic_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<bool, ScheduleError> {
        let path = format!(
            "/rest/v1/clinic_doctor?doctor_id=eq.{}&clinic_id=eq.{}&limit=1",
            doctor_id, clinic_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(Self::store_err)?;
        Ok(!rows.is_empty())
    }

    // --------------------------------------------------------------------------
    // Clinic calendar
    // --------------------------------------------------------------------------

    /// Insert or update-on-conflict by (clinic_id, date). Re-running
    /// with new hours overwrites them and always leaves the day open.
    pub async fn upsert_clinic_day(
        &self,
        clinic_id: Uuid,
        date: NaiveDate,
        opening_time: NaiveTime,
        closing_time: NaiveTime,
        auth_token: Option<&str>,
    ) -> Result<ClinicCalendarDay, ScheduleError> {
        debug!("Upserting clinic day {} for clinic {}", date, clinic_id);

        let body = json!({
            "clinic_id": clinic_id,
            "date": date,
            "day_of_week": weekday_name(date),
            "is_open": true,
            "opening_time": opening_time.format(TIME_FORMAT).to_string(),
            "closing_time": closing_time.format(TIME_FORMAT).to_string(),
        });

        let rows: Vec<ClinicCalendarDay> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/clinic_calendar?on_conflict=clinic_id,date",
                auth_token,
                Some(body),
                Some(upsert_headers()),
            )
            .await
            .map_err(Self::store_err)?;

        rows.into_iter()
            .next()
            .ok_or_else(|| ScheduleError::Store("upsert returned no clinic day row".to_string()))
    }

    pub async fn get_clinic_day(
        &self,
        clinic_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Option<ClinicCalendarDay>, ScheduleError> {
        let path = format!(
            "/rest/v1/clinic_calendar?clinic_id=eq.{}&date=eq.{}&limit=1",
            clinic_id, date
        );
        let rows: Vec<ClinicCalendarDay> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(Self::store_err)?;
        Ok(rows.into_iter().next())
    }

    pub async fn get_clinic_day_by_id(
        &self,
        schedule_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Option<ClinicCalendarDay>, ScheduleError> {
        let path = format!("/rest/v1/clinic_calendar?schedule_id=eq.{}&limit=1", schedule_id);
        let rows: Vec<ClinicCalendarDay> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(Self::store_err)?;
        Ok(rows.into_iter().next())
    }

    pub async fn update_clinic_day_hours(
        &self,
        schedule_id: Uuid,
        opening_time: NaiveTime,
        closing_time: NaiveTime,
        auth_token: Option<&str>,
    ) -> Result<(), ScheduleError> {
        let path = format!("/rest/v1/clinic_calendar?schedule_id=eq.{}", schedule_id);
        let body = json!({
            "opening_time": opening_time.format(TIME_FORMAT).to_string(),
            "closing_time": closing_time.format(TIME_FORMAT).to_string(),
        });
        self.supabase
            .execute(Method::PATCH, &path, auth_token, Some(body))
            .await
            .map_err(Self::store_err)
    }

    /// Soft close: the row is kept for history, only `is_open` flips.
    pub async fn soft_close_clinic_day(
        &self,
        schedule_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<(), ScheduleError> {
        let path = format!("/rest/v1/clinic_calendar?schedule_id=eq.{}", schedule_id);
        self.supabase
            .execute(Method::PATCH, &path, auth_token, Some(json!({ "is_open": false })))
            .await
            .map_err(Self::store_err)
    }

    pub async fn list_open_days(
        &self,
        clinic_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<ClinicCalendarDay>, ScheduleError> {
        let path = format!(
            "/rest/v1/clinic_calendar?clinic_id=eq.{}&is_open=eq.true&date=gte.{}&date=lte.{}&order=date.asc",
            clinic_id, from, to
        );
        self.supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(Self::store_err)
    }

    // --------------------------------------------------------------------------
    // Doctor calendar
    // --------------------------------------------------------------------------

    /// Insert or update-on-conflict by (doctor_id, date); returns the
    /// stored row so the caller has the schedule id for slot rows.
    pub async fn upsert_doctor_day(
        &self,
        doctor_id: Uuid,
        clinic_day: &ClinicCalendarDay,
        start_time: NaiveTime,
        end_time: NaiveTime,
        auth_token: Option<&str>,
    ) -> Result<DoctorCalendarDay, ScheduleError> {
        debug!("Upserting doctor day {} for doctor {}", clinic_day.date, doctor_id);

        let body = json!({
            "doctor_id": doctor_id,
            "clinic_id": clinic_day.clinic_id,
            "clinic_schedule_id": clinic_day.schedule_id,
            "date": clinic_day.date,
            "day_of_week": weekday_name(clinic_day.date),
            "start_time": start_time.format(TIME_FORMAT).to_string(),
            "end_time": end_time.format(TIME_FORMAT).to_string(),
            "is_available": true,
        });

        let rows: Vec<DoctorCalendarDay> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctor_calendar?on_conflict=doctor_id,date",
                auth_token,
                Some(body),
                Some(upsert_headers()),
            )
            .await
            .map_err(Self::store_err)?;

        rows.into_iter()
            .next()
            .ok_or_else(|| ScheduleError::Store("upsert returned no doctor day row".to_string()))
    }

    pub async fn get_doctor_day(
        &self,
        doctor_id: Uuid,
        schedule_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Option<DoctorCalendarDay>, ScheduleError> {
        let path = format!(
            "/rest/v1/doctor_calendar?schedule_id=eq.{}&doctor_id=eq.{}&limit=1",
            schedule_id, doctor_id
        );
        let rows: Vec<DoctorCalendarDay> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(Self::store_err)?;
        Ok(rows.into_iter().next())
    }

    pub async fn update_doctor_day_hours(
        &self,
        schedule_id: Uuid,
        start_time: NaiveTime,
        end_time: NaiveTime,
        auth_token: Option<&str>,
    ) -> Result<(), ScheduleError> {
        let path = format!("/rest/v1/doctor_calendar?schedule_id=eq.{}", schedule_id);
        let body = json!({
            "start_time": start_time.format(TIME_FORMAT).to_string(),
            "end_time": end_time.format(TIME_FORMAT).to_string(),
        });
        self.supabase
            .execute(Method::PATCH, &path, auth_token, Some(body))
            .await
            .map_err(Self::store_err)
    }

    /// Deletes the doctor day and its slots. The slot delete filters
    /// on `is_booked=false`; callers must have run the guard first.
    pub async fn delete_doctor_day(
        &self,
        day: &DoctorCalendarDay,
        auth_token: Option<&str>,
    ) -> Result<(), ScheduleError> {
        let slots_path = format!(
            "/rest/v1/appointment_slots?doctor_day_id=eq.{}&is_booked=eq.false",
            day.schedule_id
        );
        self.supabase
            .execute(Method::DELETE, &slots_path, auth_token, None)
            .await
            .map_err(Self::store_err)?;

        let day_path = format!("/rest/v1/doctor_calendar?schedule_id=eq.{}", day.schedule_id);
        self.supabase
            .execute(Method::DELETE, &day_path, auth_token, None)
            .await
            .map_err(Self::store_err)
    }

    pub async fn list_doctor_days(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<DoctorCalendarDay>, ScheduleError> {
        let path = format!(
            "/rest/v1/doctor_calendar?doctor_id=eq.{}&order=date.asc",
            doctor_id
        );
        self.supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(Self::store_err)
    }

    // --------------------------------------------------------------------------
    // Appointment slots
    // --------------------------------------------------------------------------

    /// Idempotent replace: drop every unbooked slot of the day, then
    /// insert the freshly generated list. Fails loudly if any slot of
    /// the day is booked; regeneration must never touch such a day.
    pub async fn replace_slots(
        &self,
        day: &DoctorCalendarDay,
        slots: &[SlotWindow],
        auth_token: Option<&str>,
    ) -> Result<(), ScheduleError> {
        let booked_path = format!(
            "/rest/v1/appointment_slots?doctor_day_id=eq.{}&is_booked=eq.true&limit=1",
            day.schedule_id
        );
        let booked: Vec<Value> = self
            .supabase
            .request(Method::GET, &booked_path, auth_token, None)
            .await
            .map_err(Self::store_err)?;
        if !booked.is_empty() {
            return Err(ScheduleError::Conflict(format!(
                "refusing to regenerate slots: a booked slot exists on {}",
                day.date
            )));
        }

        let delete_path = format!(
            "/rest/v1/appointment_slots?doctor_day_id=eq.{}&is_booked=eq.false",
            day.schedule_id
        );
        self.supabase
            .execute(Method::DELETE, &delete_path, auth_token, None)
            .await
            .map_err(Self::store_err)?;

        if slots.is_empty() {
            return Ok(());
        }

        let rows: Vec<Value> = slots
            .iter()
            .map(|slot| {
                json!({
                    "doctor_id": day.doctor_id,
                    "clinic_id": day.clinic_id,
                    "doctor_day_id": day.schedule_id,
                    "slot_date": day.date,
                    "start_time": slot.start.format(TIME_FORMAT).to_string(),
                    "end_time": slot.end.format(TIME_FORMAT).to_string(),
                    "is_booked": false,
                })
            })
            .collect();

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointment_slots",
                auth_token,
                Some(Value::Array(rows)),
                Some(representation_headers()),
            )
            .await
            .map_err(Self::store_err)?;

        Ok(())
    }

    pub async fn list_doctor_slots(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<AppointmentSlot>, ScheduleError> {
        let path = format!(
            "/rest/v1/appointment_slots?doctor_id=eq.{}&order=slot_date.asc,start_time.asc",
            doctor_id
        );
        self.supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(Self::store_err)
    }
}
