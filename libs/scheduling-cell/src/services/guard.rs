use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::ScheduleError;

/// What the booking barrier is checked against: a whole clinic date
/// (any doctor's slot under it) or one doctor's own day.
#[derive(Debug, Clone, Copy)]
pub enum ConflictScope {
    ClinicDay { clinic_id: Uuid, date: NaiveDate },
    DoctorDay { doctor_id: Uuid, date: NaiveDate },
}

impl ConflictScope {
    pub fn date(&self) -> NaiveDate {
        match self {
            ConflictScope::ClinicDay { date, .. } => *date,
            ConflictScope::DoctorDay { date, .. } => *date,
        }
    }
}

/// Consulted immediately before any mutation that would change hours
/// or delete a day's slots. A hit aborts that one date, never the
/// whole batch. Advisory only: the check and the following write are
/// not one transaction, so the destructive statements themselves also
/// filter on `is_booked=false`.
pub struct BookingGuard {
    supabase: Arc<SupabaseClient>,
}

impl BookingGuard {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn has_booked_conflict(
        &self,
        scope: &ConflictScope,
        auth_token: Option<&str>,
    ) -> Result<bool, ScheduleError> {
        let path = match scope {
            ConflictScope::ClinicDay { clinic_id, date } => format!(
                "/rest/v1/appointment_slots?clinic_id=eq.{}&slot_date=eq.{}&is_booked=eq.true&limit=1",
                clinic_id, date
            ),
            ConflictScope::DoctorDay { doctor_id, date } => format!(
                "/rest/v1/appointment_slots?doctor_id=eq.{}&slot_date=eq.{}&is_booked=eq.true&limit=1",
                doctor_id, date
            ),
        };

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| ScheduleError::Store(e.to_string()))?;

        if !rows.is_empty() {
            warn!("Booked slot found on {}, mutation will be blocked", scope.date());
        }

        Ok(!rows.is_empty())
    }
}
