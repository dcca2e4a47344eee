use chrono::NaiveDateTime;

use crate::parse::markers::strip_snooze;
use crate::parse::{due_date, snooze_minutes};
use crate::util::dates::minutes_of_day;

/// A snooze marker is spent once its day is today or earlier and its
/// time has passed. Lines without a usable date count as today.
pub fn snooze_expired(text: &str, now: NaiveDateTime) -> bool {
    let Some(snooze) = snooze_minutes(text) else {
        return false;
    };
    let date = due_date(text).date().unwrap_or(now.date());
    date <= now.date() && snooze < minutes_of_day(now)
}

/// The line with its spent snooze marker removed, or `None` if there is
/// nothing to clear.
pub fn clear_expired(text: &str, now: NaiveDateTime) -> Option<String> {
    snooze_expired(text, now).then(|| strip_snooze(text).trim_end().to_string())
}
