pub mod dates;

pub use dates::{next_occurrence, today_in, weekday_name, weekly_occurrences};
