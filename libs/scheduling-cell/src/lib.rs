pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use models::{
    AppointmentSlot, CalendarEvent, ClinicCalendarDay, ClinicWeeklyScheduleRequest,
    DayMutationOutcome, DoctorCalendarDay, DoctorWeeklyScheduleRequest, ScheduleBatchOutcome,
    ScheduleError, SkippedDate,
};
pub use services::{
    clinic_calendar::ClinicCalendarService, doctor_calendar::DoctorCalendarService,
};
