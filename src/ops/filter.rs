use std::cmp::Reverse;

use chrono::{NaiveDate, NaiveDateTime};

use crate::model::filter::{DateBucket, FilterState};
use crate::model::task::TaskLine;
use crate::parse::markers::has_snooze;
use crate::parse::{DueDate, due_date, snooze_minutes};
use crate::util::dates::{add_days, minutes_of_day};

/// Date-bucket predicate. Lines without a due marker pass every bucket;
/// lines whose marker is not a real date only pass `All`.
pub fn bucket_keeps(text: &str, bucket: DateBucket, today: NaiveDate) -> bool {
    if bucket == DateBucket::All {
        return true;
    }
    let date = match due_date(text) {
        DueDate::Missing => return true,
        DueDate::Invalid => return false,
        DueDate::On(d) => d,
    };
    match bucket {
        DateBucket::All => true,
        DateBucket::Today => date == today,
        DateBucket::Past => date < today,
        DateBucket::Tomorrow => date == add_days(today, 1),
        DateBucket::NextWeek => date > today && date < add_days(today, 7),
        DateBucket::NextMonth => date > today && date < add_days(today, 30),
        DateBucket::TodayOrBefore => date <= today,
    }
}

/// Case-insensitive substring over the whole line; empty needle passes.
pub fn text_keeps(text: &str, needle: &str) -> bool {
    needle.is_empty() || text.to_lowercase().contains(&needle.to_lowercase())
}

/// Hourly-snooze visibility. Lines snoozed for later today stay hidden
/// until the snooze time is reached; a snooze on any other day is ignored.
pub fn snooze_visible(text: &str, now: NaiveDateTime) -> bool {
    if !has_snooze(text) {
        return true;
    }
    let reached = snooze_minutes(text).is_some_and(|m| m <= minutes_of_day(now));
    match due_date(text) {
        DueDate::On(date) if date != now.date() => true,
        _ => reached,
    }
}

/// Run the full display filter: bucket, then text, then (optionally)
/// hourly-snooze exclusion, then a stable sort by descending priority.
pub fn apply_filters<'a>(
    tasks: &'a [TaskLine],
    filter: &FilterState,
    now: NaiveDateTime,
) -> Vec<&'a TaskLine> {
    filtered_positions(tasks, filter, now)
        .into_iter()
        .map(|i| &tasks[i])
        .collect()
}

/// Like `apply_filters`, but yields positions in `tasks`.
pub fn filtered_positions(
    tasks: &[TaskLine],
    filter: &FilterState,
    now: NaiveDateTime,
) -> Vec<usize> {
    let today = now.date();
    let mut kept: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| bucket_keeps(&t.text, filter.bucket, today))
        .filter(|(_, t)| text_keeps(&t.text, &filter.text))
        .filter(|(_, t)| !filter.exclude_hourly_snooze || snooze_visible(&t.text, now))
        .map(|(i, _)| i)
        .collect();
    kept.sort_by_key(|&i| Reverse(tasks[i].priority().weight()));
    kept
}
