use chrono::{Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

/// Calendar-date arithmetic for weekly schedules.
///
/// Weekdays are Sunday-based (0 = Sunday .. 6 = Saturday), matching
/// the request format the schedule forms submit. All "today" anchoring
/// happens in the single operational timezone so a schedule submitted
/// near UTC midnight never lands on the wrong local day.

/// First date on or after `reference` falling on `weekday`. If the
/// reference date itself matches, it is returned unchanged.
pub fn next_occurrence(weekday: u32, reference: NaiveDate) -> NaiveDate {
    let current = reference.weekday().num_days_from_sunday();
    let delta = (weekday % 7 + 7 - current) % 7;
    reference + Duration::days(delta as i64)
}

/// The next `weeks` concrete dates for `weekday`, starting from the
/// first occurrence on or after `reference` and marching forward seven
/// days at a time.
pub fn weekly_occurrences(weekday: u32, reference: NaiveDate, weeks: u32) -> Vec<NaiveDate> {
    let first = next_occurrence(weekday, reference);
    (0..weeks)
        .map(|week| first + Duration::days(7 * week as i64))
        .collect()
}

/// English weekday name as stored in the calendar rows.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday().num_days_from_sunday() {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        _ => "Saturday",
    }
}

/// Today's calendar date in the operational timezone.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn next_occurrence_is_inclusive_of_reference() {
        // 2025-06-02 is a Monday; asking for Monday returns it unchanged.
        let monday = date(2025, 6, 2);
        assert_eq!(next_occurrence(1, monday), monday);
    }

    #[test]
    fn next_occurrence_lands_within_following_six_days() {
        // 2025-06-04 is a Wednesday; next Monday is 2025-06-09.
        let wednesday = date(2025, 6, 4);
        assert_eq!(next_occurrence(1, wednesday), date(2025, 6, 9));
        // Next Tuesday is six days out.
        assert_eq!(next_occurrence(2, wednesday), date(2025, 6, 10));
        // Same-week Saturday.
        assert_eq!(next_occurrence(6, wednesday), date(2025, 6, 7));
    }

    #[test]
    fn weekly_occurrences_march_in_seven_day_steps() {
        // Reference Wednesday, three Mondays requested.
        let wednesday = date(2025, 6, 4);
        let mondays = weekly_occurrences(1, wednesday, 3);
        assert_eq!(
            mondays,
            vec![date(2025, 6, 9), date(2025, 6, 16), date(2025, 6, 23)]
        );
    }

    #[test]
    fn weekly_occurrences_empty_for_zero_weeks() {
        assert!(weekly_occurrences(1, date(2025, 6, 4), 0).is_empty());
    }

    #[test]
    fn weekday_names_match_sunday_based_numbering() {
        assert_eq!(weekday_name(date(2025, 6, 1)), "Sunday");
        assert_eq!(weekday_name(date(2025, 6, 2)), "Monday");
        assert_eq!(weekday_name(date(2025, 6, 7)), "Saturday");
    }

    #[test]
    fn month_and_year_boundaries_are_plain_date_arithmetic() {
        // 2025-12-31 is a Wednesday; next Friday crosses into 2026.
        let wednesday = date(2025, 12, 31);
        assert_eq!(next_occurrence(5, wednesday), date(2026, 1, 2));
    }
}
