// Doctor calendar manager against a mocked Supabase store: nesting
// inside clinic hours, slot regeneration and the booking barrier.

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::models::{DoctorWeeklyScheduleRequest, ScheduleError, UpdateDoctorDayRequest};
use scheduling_cell::DoctorCalendarService;
use shared_config::AppConfig;
use shared_utils::{today_in, weekday_name, weekly_occurrences};

const TOKEN: &str = "test-token";

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn test_config(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        clinic_timezone: "UTC".to_string(),
        store_timeout_secs: 5,
    }
}

struct Ids {
    doctor_id: Uuid,
    clinic_id: Uuid,
    clinic_schedule_id: Uuid,
    doctor_schedule_id: Uuid,
}

impl Ids {
    fn new() -> Self {
        Self {
            doctor_id: Uuid::new_v4(),
            clinic_id: Uuid::new_v4(),
            clinic_schedule_id: Uuid::new_v4(),
            doctor_schedule_id: Uuid::new_v4(),
        }
    }

    fn clinic_day_json(&self, date: NaiveDate, open: &str, close: &str, is_open: bool) -> serde_json::Value {
        json!({
            "schedule_id": self.clinic_schedule_id,
            "clinic_id": self.clinic_id,
            "date": date,
            "day_of_week": weekday_name(date),
            "is_open": is_open,
            "opening_time": open,
            "closing_time": close,
        })
    }

    fn doctor_day_json(&self, date: NaiveDate, start: &str, end: &str) -> serde_json::Value {
        json!({
            "schedule_id": self.doctor_schedule_id,
            "doctor_id": self.doctor_id,
            "clinic_id": self.clinic_id,
            "clinic_schedule_id": self.clinic_schedule_id,
            "date": date,
            "day_of_week": weekday_name(date),
            "start_time": start,
            "end_time": end,
            "is_available": true,
        })
    }

    fn slot_json(&self, date: NaiveDate, start: &str, end: &str, is_booked: bool) -> serde_json::Value {
        json!({
            "slot_id": Uuid::new_v4(),
            "doctor_id": self.doctor_id,
            "clinic_id": self.clinic_id,
            "doctor_day_id": self.doctor_schedule_id,
            "slot_date": date,
            "start_time": start,
            "end_time": end,
            "is_booked": is_booked,
        })
    }
}

fn schedule_request(ids: &Ids) -> DoctorWeeklyScheduleRequest {
    DoctorWeeklyScheduleRequest {
        clinic_id: ids.clinic_id,
        weekdays: vec![1],
        start_time: t(9, 0),
        end_time: t(17, 0),
        lunch_start: Some(t(12, 0)),
        lunch_end: Some(t(13, 0)),
        slot_duration_minutes: 30,
        recurrence_weeks: 1,
    }
}

async fn mount_affiliation(server: &MockServer, ids: &Ids, affiliated: bool) {
    let body = if affiliated {
        json!([{ "doctor_id": ids.doctor_id, "clinic_id": ids.clinic_id }])
    } else {
        json!([])
    };
    Mock::given(method("GET"))
        .and(path("/rest/v1/clinic_doctor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_no_slots(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointment_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn applied_day_regenerates_the_full_slot_tiling() {
    let server = MockServer::start().await;
    let ids = Ids::new();
    let date = weekly_occurrences(1, today_in(Tz::UTC), 1)[0];

    mount_affiliation(&server, &ids, true).await;
    mount_no_slots(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/clinic_calendar"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([ids.clinic_day_json(date, "09:00:00", "17:00:00", true)])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_calendar"))
        .and(query_param("on_conflict", "doctor_id,date"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([ids.doctor_day_json(date, "09:00:00", "17:00:00")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointment_slots"))
        .and(query_param("is_booked", "eq.false"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    // 09:00-17:00 with lunch 12:00-13:00 at 30 minutes tiles into 14
    // slots; the batch insert carries exactly that tiling.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointment_slots"))
        .and(body_partial_json(json!([
            { "start_time": "09:00:00", "end_time": "09:30:00", "is_booked": false }
        ])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let service = DoctorCalendarService::new(&test_config(&server));
    let outcome = service
        .add_weekly_schedule(ids.doctor_id, schedule_request(&ids), TOKEN)
        .await
        .unwrap();

    assert_eq!(outcome.applied_dates, vec![date]);
    assert!(outcome.skipped.is_empty());

    let inserted: Vec<serde_json::Value> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method == wiremock::http::Method::POST && r.url.path() == "/rest/v1/appointment_slots")
        .flat_map(|r| serde_json::from_slice::<Vec<serde_json::Value>>(&r.body).unwrap())
        .collect();
    assert_eq!(inserted.len(), 14);
    assert_eq!(inserted[6]["start_time"], "13:00:00");
    assert!(inserted.iter().all(|s| s["is_booked"] == false));
}

#[tokio::test]
async fn hours_outside_clinic_hours_skip_the_date() {
    let server = MockServer::start().await;
    let ids = Ids::new();
    let date = weekly_occurrences(1, today_in(Tz::UTC), 1)[0];

    mount_affiliation(&server, &ids, true).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/clinic_calendar"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([ids.clinic_day_json(date, "09:00:00", "17:00:00", true)])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_calendar"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let mut request = schedule_request(&ids);
    request.start_time = t(8, 0);
    request.end_time = t(18, 0);
    request.lunch_start = None;
    request.lunch_end = None;

    let service = DoctorCalendarService::new(&test_config(&server));
    let outcome = service
        .add_weekly_schedule(ids.doctor_id, request, TOKEN)
        .await
        .unwrap();

    assert!(outcome.applied_dates.is_empty());
    assert_eq!(outcome.skipped.len(), 1);
    let reason = &outcome.skipped[0].reason;
    assert!(reason.contains("08:00-18:00"));
    assert!(reason.contains("09:00-17:00"));
}

#[tokio::test]
async fn closed_or_missing_clinic_day_skips_the_date() {
    let server = MockServer::start().await;
    let ids = Ids::new();
    let date = weekly_occurrences(1, today_in(Tz::UTC), 1)[0];

    mount_affiliation(&server, &ids, true).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/clinic_calendar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = DoctorCalendarService::new(&test_config(&server));
    let outcome = service
        .add_weekly_schedule(ids.doctor_id, schedule_request(&ids), TOKEN)
        .await
        .unwrap();

    assert!(outcome.applied_dates.is_empty());
    assert_eq!(outcome.skipped[0].reason, format!("clinic not open on {}", date));
}

#[tokio::test]
async fn unaffiliated_doctor_is_rejected_before_any_date_math() {
    let server = MockServer::start().await;
    let ids = Ids::new();

    mount_affiliation(&server, &ids, false).await;

    let service = DoctorCalendarService::new(&test_config(&server));
    let err = service
        .add_weekly_schedule(ids.doctor_id, schedule_request(&ids), TOKEN)
        .await
        .unwrap_err();

    assert_matches!(err, ScheduleError::Validation(fields) => {
        assert!(fields["clinic_id"].contains("not affiliated"));
    });
}

#[tokio::test]
async fn booked_date_blocks_regeneration_for_that_date_only() {
    let server = MockServer::start().await;
    let ids = Ids::new();
    let today = today_in(Tz::UTC);
    let dates = weekly_occurrences(3, today, 2);

    mount_affiliation(&server, &ids, true).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/clinic_calendar"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([ids.clinic_day_json(dates[0], "09:00:00", "17:00:00", true)])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointment_slots"))
        .and(query_param("slot_date", format!("eq.{}", dates[0])))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([ids.slot_json(dates[0], "10:00:00", "10:30:00", true)])),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    mount_no_slots(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_calendar"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([ids.doctor_day_json(dates[1], "09:00:00", "17:00:00")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointment_slots"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointment_slots"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mut request = schedule_request(&ids);
    request.weekdays = vec![3];
    request.recurrence_weeks = 2;

    let service = DoctorCalendarService::new(&test_config(&server));
    let outcome = service
        .add_weekly_schedule(ids.doctor_id, request, TOKEN)
        .await
        .unwrap();

    assert_eq!(outcome.applied_dates, vec![dates[1]]);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].date, dates[0]);
    assert!(outcome.skipped[0].reason.contains(&dates[0].to_string()));
}

#[tokio::test]
async fn update_is_blocked_when_new_hours_leave_the_clinic_window() {
    let server = MockServer::start().await;
    let ids = Ids::new();
    let date = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_calendar"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([ids.doctor_day_json(date, "09:00:00", "17:00:00")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/clinic_calendar"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([ids.clinic_day_json(date, "09:00:00", "17:00:00", true)])),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctor_calendar"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let service = DoctorCalendarService::new(&test_config(&server));
    let outcome = service
        .update_single_day(
            ids.doctor_id,
            ids.doctor_schedule_id,
            UpdateDoctorDayRequest {
                start_time: t(8, 0),
                end_time: t(18, 0),
                lunch_start: None,
                lunch_end: None,
                slot_duration_minutes: 30,
            },
            TOKEN,
        )
        .await
        .unwrap();

    assert!(!outcome.ok);
    assert!(outcome.reason.unwrap().contains("outside clinic hours"));
}

#[tokio::test]
async fn deleting_a_day_with_a_booked_slot_is_blocked() {
    let server = MockServer::start().await;
    let ids = Ids::new();
    let date = NaiveDate::from_ymd_opt(2026, 9, 16).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_calendar"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([ids.doctor_day_json(date, "09:00:00", "17:00:00")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointment_slots"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([ids.slot_json(date, "10:00:00", "10:30:00", true)])),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointment_slots"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/doctor_calendar"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let service = DoctorCalendarService::new(&test_config(&server));
    let outcome = service
        .delete_single_day(ids.doctor_id, ids.doctor_schedule_id, TOKEN)
        .await
        .unwrap();

    assert!(!outcome.ok);
    assert!(outcome.reason.unwrap().contains("2026-09-16"));
}

#[tokio::test]
async fn deleting_a_clear_day_removes_day_and_unbooked_slots() {
    let server = MockServer::start().await;
    let ids = Ids::new();
    let date = NaiveDate::from_ymd_opt(2026, 9, 16).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_calendar"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([ids.doctor_day_json(date, "09:00:00", "17:00:00")])),
        )
        .mount(&server)
        .await;
    mount_no_slots(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointment_slots"))
        .and(query_param("is_booked", "eq.false"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/doctor_calendar"))
        .and(query_param("schedule_id", format!("eq.{}", ids.doctor_schedule_id)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let service = DoctorCalendarService::new(&test_config(&server));
    let outcome = service
        .delete_single_day(ids.doctor_id, ids.doctor_schedule_id, TOKEN)
        .await
        .unwrap();

    assert!(outcome.ok);
    assert!(outcome.reason.is_none());
}

#[tokio::test]
async fn calendar_view_interleaves_days_and_slots_with_booked_marking() {
    let server = MockServer::start().await;
    let ids = Ids::new();
    let date = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_calendar"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([ids.doctor_day_json(date, "09:00:00", "17:00:00")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointment_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            ids.slot_json(date, "09:00:00", "09:30:00", false),
            ids.slot_json(date, "09:30:00", "10:00:00", true),
        ])))
        .mount(&server)
        .await;

    let service = DoctorCalendarService::new(&test_config(&server));
    let events = service.build_calendar_view(ids.doctor_id, None).await.unwrap();

    assert_eq!(events.len(), 3);
    // The all-day work block sorts before the timed slots of the day.
    assert_eq!(events[0].title, "Work from 09:00 to 17:00");
    assert_eq!(events[0].start, "2026-09-14");
    assert!(events[0].color.is_none());

    assert_eq!(events[1].title, "Appointment");
    assert_eq!(events[1].start, "2026-09-14T09:00:00");
    assert_eq!(events[1].end.as_deref(), Some("2026-09-14T09:30:00"));
    assert!(events[1].color.is_none());

    assert_eq!(events[2].start, "2026-09-14T09:30:00");
    assert_eq!(events[2].color.as_deref(), Some("red"));
}
