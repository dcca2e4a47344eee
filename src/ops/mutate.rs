use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::model::task::Priority;
use crate::parse::markers::{
    add_tag, complete, set_due_date, set_priority, set_snooze, strip_snooze,
};
use crate::util::dates::{add_days, days_until_weekday, minutes_of_day, parse_time};

/// How far to push a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnoozeSpec {
    Minutes(u32),
    Hours(u32),
    Days(u32),
    Weeks(u32),
    /// Next occurrence of this weekday (never today)
    Weekday(Weekday),
    /// A clock time today, or tomorrow if it has already passed
    At { hour: u32, minute: u32 },
}

impl fmt::Display for SnoozeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnoozeSpec::Minutes(n) => write!(f, "{}m", n),
            SnoozeSpec::Hours(n) => write!(f, "{}h", n),
            SnoozeSpec::Days(n) => write!(f, "{}d", n),
            SnoozeSpec::Weeks(n) => write!(f, "{}w", n),
            SnoozeSpec::Weekday(w) => write!(f, "{}", w),
            SnoozeSpec::At { hour, minute } => write!(f, "{:02}:{:02}", hour, minute),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid snooze '{0}' (try 10m, 2h, 3d, 3w, mon, 13:00, 4p)")]
pub struct ParseSnoozeError(String);

impl FromStr for SnoozeSpec {
    type Err = ParseSnoozeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSnoozeError(s.to_string());
        let lower = s.trim().to_ascii_lowercase();
        if lower.is_empty() {
            return Err(err());
        }

        if let Ok(day) = lower.parse::<Weekday>() {
            return Ok(SnoozeSpec::Weekday(day));
        }

        if lower.contains(':') {
            let minutes = parse_time(&lower).ok_or_else(err)?;
            return Ok(SnoozeSpec::At {
                hour: minutes / 60,
                minute: minutes % 60,
            });
        }

        let split = lower
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(err)?;
        let (digits, unit) = lower.split_at(split);
        let n: u32 = digits.parse().map_err(|_| err())?;
        match unit.trim() {
            "m" | "min" | "mins" | "minutes" => Ok(SnoozeSpec::Minutes(n)),
            "h" | "hour" | "hours" => Ok(SnoozeSpec::Hours(n)),
            "d" | "day" | "days" => Ok(SnoozeSpec::Days(n)),
            "w" | "week" | "weeks" => Ok(SnoozeSpec::Weeks(n)),
            "a" | "am" | "p" | "pm" if (1..=12).contains(&n) => {
                let pm = unit.trim().starts_with('p');
                let hour = match (n, pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, false) => h,
                    (h, true) => h + 12,
                };
                Ok(SnoozeSpec::At { hour, minute: 0 })
            }
            _ => Err(err()),
        }
    }
}

/// Move the due date to `today + days` and drop any hourly snooze.
pub fn snooze_days(text: &str, today: NaiveDate, days: i64) -> String {
    strip_snooze(&set_due_date(text, add_days(today, days)))
}

/// Snooze for a number of minutes from `now`. The date is always forced to
/// today; the hourly marker takes the clock time of `now + minutes`.
pub fn snooze_for(text: &str, now: NaiveDateTime, minutes: i64) -> String {
    let target = now + Duration::minutes(minutes);
    set_snooze(&set_due_date(text, now.date()), minutes_of_day(target))
}

/// Snooze until a clock time, rolling to tomorrow when it has passed.
pub fn snooze_until(text: &str, now: NaiveDateTime, hour: u32, minute: u32) -> String {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let mut date = now.date();
    if now > date.and_time(time) {
        date = add_days(date, 1);
    }
    let text = set_due_date(text, date);
    set_snooze(&text, hour * 60 + minute).trim_end().to_string()
}

pub fn snooze(text: &str, spec: SnoozeSpec, now: NaiveDateTime) -> String {
    let today = now.date();
    match spec {
        SnoozeSpec::Minutes(n) => snooze_for(text, now, n as i64),
        SnoozeSpec::Hours(n) => snooze_for(text, now, n as i64 * 60),
        SnoozeSpec::Days(n) => snooze_days(text, today, n as i64),
        SnoozeSpec::Weeks(n) => snooze_days(text, today, n as i64 * 7),
        SnoozeSpec::Weekday(day) => snooze_days(text, today, days_until_weekday(today, day)),
        SnoozeSpec::At { hour, minute } => snooze_until(text, now, hour, minute),
    }
}

/// A single-task text transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Snooze(SnoozeSpec),
    Priority(Priority),
    Complete,
    Tag(String),
}

impl Mutation {
    pub fn apply(&self, text: &str, now: NaiveDateTime) -> String {
        match self {
            Mutation::Snooze(spec) => snooze(text, *spec, now),
            Mutation::Priority(p) => set_priority(text, *p),
            Mutation::Complete => complete(text),
            Mutation::Tag(tag) => add_tag(text, tag),
        }
    }

    /// Snoozes can push the task out of the visible list, so the cursor
    /// stays on the same row rather than following the task.
    pub fn keeps_row(&self) -> bool {
        matches!(self, Mutation::Snooze(_))
    }

    /// Short name for usage counting.
    pub fn label(&self) -> String {
        match self {
            Mutation::Snooze(spec) => spec.to_string(),
            Mutation::Priority(Priority::High) => "high".to_string(),
            Mutation::Priority(Priority::Low) => "low".to_string(),
            Mutation::Priority(Priority::Normal) => "nopri".to_string(),
            Mutation::Complete => "done".to_string(),
            Mutation::Tag(tag) => format!("#{}", tag.trim_start_matches('#')),
        }
    }
}
