use chrono::{Duration, NaiveTime};

/// A generated slot window within one doctor day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Explode a working interval into fixed-duration bookable slots,
/// excluding the lunch window.
///
/// The cursor starts at `start` and always advances by `duration`,
/// whether or not a slot was emitted: a candidate overlapping the
/// lunch window (`cursor < lunch_end && candidate_end > lunch_start`,
/// half-open intervals) is dropped rather than compacted, so a lunch
/// window not aligned to the slot grid silently costs the straddling
/// candidates. The walk stops once the candidate end would pass
/// `end`.
///
/// Pure and deterministic: identical inputs yield an identical
/// ordered sequence, which the delete-then-recreate regeneration in
/// the doctor calendar service relies on.
pub fn generate_day_slots(
    start: NaiveTime,
    end: NaiveTime,
    lunch: Option<(NaiveTime, NaiveTime)>,
    duration_minutes: i32,
) -> Vec<SlotWindow> {
    if duration_minutes <= 0 {
        return Vec::new();
    }

    let step = Duration::minutes(duration_minutes as i64);
    let mut slots = Vec::new();
    let mut cursor = start;

    loop {
        let (candidate_end, wrapped) = cursor.overflowing_add_signed(step);
        if wrapped != 0 || candidate_end > end {
            break;
        }

        let overlaps_lunch = match lunch {
            Some((lunch_start, lunch_end)) => cursor < lunch_end && candidate_end > lunch_start,
            None => false,
        };

        if !overlaps_lunch {
            slots.push(SlotWindow { start: cursor, end: candidate_end });
        }

        cursor = candidate_end;
    }

    slots
}
