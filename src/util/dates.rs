use std::cell::Cell;
use std::rc::Rc;

use chrono::{Datelike, Days, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

/// Date format used by the due-date marker.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of "now" for every date- and time-dependent operation.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock pinned to a settable instant (tests, replay).
#[derive(Debug)]
pub struct FixedClock(Cell<NaiveDateTime>);

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        FixedClock(Cell::new(now))
    }

    /// Convenience constructor: `FixedClock::at("2024-06-01", "10:00")`.
    /// Panics on malformed input; intended for tests.
    pub fn at(date: &str, time: &str) -> Self {
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT).expect("valid date");
        let time = NaiveTime::parse_from_str(time, "%H:%M").expect("valid time");
        FixedClock::new(date.and_time(time))
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.0.set(now);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0.get()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// Calendar-correct day arithmetic. Negative `days` go backwards.
/// Saturates (returns `date` unchanged) outside chrono's representable range.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// Parse `HH:MM` into minutes since midnight.
pub fn parse_time(s: &str) -> Option<u32> {
    let (h, m) = s.split_once(':')?;
    let hour: u32 = h.trim().parse().ok()?;
    let minute: u32 = m.trim().parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Minutes since midnight for a timestamp.
pub fn minutes_of_day(dt: NaiveDateTime) -> u32 {
    dt.hour() * 60 + dt.minute()
}

/// Render minutes-since-midnight as zero-padded `HH:MM`.
pub fn format_time(minutes: u32) -> String {
    format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60)
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Days from `today` until the next `target` weekday, in `1..=7`.
/// The same weekday as today counts as a full week away.
pub fn days_until_weekday(today: NaiveDate, target: Weekday) -> i64 {
    let current = today.weekday().num_days_from_monday() as i64;
    let wanted = target.num_days_from_monday() as i64;
    let mut days = wanted - current;
    if days <= 0 {
        days += 7;
    }
    days
}
