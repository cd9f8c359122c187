pub mod clinic_calendar;
pub mod doctor_calendar;
pub mod guard;
pub mod slots;
pub mod validation;
