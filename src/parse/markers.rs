//! The task-line marker grammar.
//!
//! Markers may appear anywhere after the description, in any order, so
//! every operation here finds and rewrites one marker kind by pattern and
//! leaves the rest of the line alone.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::model::task::Priority;
use crate::util::dates::{format_date, format_time, parse_date, parse_time};

pub const DUE_GLYPH: &str = "📅";
pub const HIGH_GLYPH: &str = "⏫";
pub const LOW_GLYPH: &str = "🔽";
pub const OPEN_CHECKBOX: &str = "[ ]";
pub const DONE_CHECKBOX: &str = "[x]";
pub const SNOOZE_PREFIX: &str = "snz:";

static BARE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date regex"));

static DUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"📅\s*(\d{4}-\d{2}-\d{2})").expect("valid due regex"));

static SNOOZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"snz:(\d{2}:\d{2})").expect("valid snooze regex"));

/// Snooze marker with the whitespace in front of it, for clean removal.
static SNOOZE_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*snz:\d{2}:\d{2}").expect("valid snooze regex"));

static PRIORITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[⏫🔽]").expect("valid priority regex"));

static PRIORITY_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s?[⏫🔽]").expect("valid priority regex"));

/// The due date carried by a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDate {
    /// No `📅 YYYY-MM-DD` marker
    Missing,
    /// Marker present, but not a real calendar date (e.g. `2024-13-40`)
    Invalid,
    On(NaiveDate),
}

impl DueDate {
    pub fn date(self) -> Option<NaiveDate> {
        match self {
            DueDate::On(d) => Some(d),
            _ => None,
        }
    }
}

/// A line is a task when it carries the due glyph, something shaped like
/// a date, and an open checkbox.
pub fn is_task_line(line: &str) -> bool {
    line.contains(DUE_GLYPH) && BARE_DATE_RE.is_match(line) && line.contains(OPEN_CHECKBOX)
}

pub fn due_date(text: &str) -> DueDate {
    match DUE_RE.captures(text) {
        None => DueDate::Missing,
        Some(caps) => match parse_date(&caps[1]) {
            Some(d) => DueDate::On(d),
            None => DueDate::Invalid,
        },
    }
}

/// Raw `HH:MM` of the first snooze marker.
pub fn snooze_marker(text: &str) -> Option<&str> {
    SNOOZE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Snooze marker as minutes since midnight. `None` when absent or when
/// the digits are not a real clock time.
pub fn snooze_minutes(text: &str) -> Option<u32> {
    snooze_marker(text).and_then(parse_time)
}

pub fn has_snooze(text: &str) -> bool {
    SNOOZE_RE.is_match(text)
}

pub fn priority_of(text: &str) -> Priority {
    if text.contains(HIGH_GLYPH) {
        Priority::High
    } else if text.contains(LOW_GLYPH) {
        Priority::Low
    } else {
        Priority::Normal
    }
}

pub fn has_priority(text: &str) -> bool {
    PRIORITY_RE.is_match(text)
}

/// Replace every due marker with `📅 <date>`, or append one.
pub fn set_due_date(text: &str, date: NaiveDate) -> String {
    let marker = format!("{} {}", DUE_GLYPH, format_date(date));
    if DUE_RE.is_match(text) {
        DUE_RE.replace_all(text, marker.as_str()).into_owned()
    } else {
        format!("{} {}", text, marker)
    }
}

/// Replace the snooze marker with `snz:<HH:MM>`, or append one.
pub fn set_snooze(text: &str, minutes: u32) -> String {
    let marker = format!("{}{}", SNOOZE_PREFIX, format_time(minutes));
    if SNOOZE_RE.is_match(text) {
        SNOOZE_RE.replace_all(text, marker.as_str()).into_owned()
    } else {
        format!("{} {}", text, marker)
    }
}

/// Remove every snooze marker along with the whitespace before it.
pub fn strip_snooze(text: &str) -> String {
    SNOOZE_STRIP_RE.replace_all(text, "").into_owned()
}

/// Set the priority glyph. At most one glyph survives: the first existing
/// one is replaced in place and the rest removed; with none present the
/// glyph is appended. `Normal` strips them all.
pub fn set_priority(text: &str, priority: Priority) -> String {
    let Some(glyph) = priority.glyph() else {
        return PRIORITY_STRIP_RE.replace_all(text, "").trim_end().to_string();
    };
    match PRIORITY_RE.find(text) {
        None => format!("{} {}", text, glyph),
        Some(first) => {
            let head = &text[..first.start()];
            let tail = PRIORITY_STRIP_RE.replace_all(&text[first.end()..], "");
            format!("{}{}{}", head, glyph, tail)
        }
    }
}

/// Flip the first open checkbox to done; nothing else changes.
pub fn complete(text: &str) -> String {
    text.replacen(OPEN_CHECKBOX, DONE_CHECKBOX, 1)
}

/// Append `#tag` unless that exact token text is already on the line.
pub fn add_tag(text: &str, tag: &str) -> String {
    let token = format!("#{}", tag.trim().trim_start_matches('#'));
    if token.len() == 1 || text.contains(&token) {
        text.to_string()
    } else {
        format!("{} {}", text, token)
    }
}

/// Compose a fresh task line: `* [ ] <description> [glyph] 📅 <date>`.
pub fn compose_task(description: &str, priority: Priority, date: NaiveDate) -> String {
    let description = description.trim();
    match priority.glyph() {
        Some(glyph) => format!(
            "* {} {} {} {} {}",
            OPEN_CHECKBOX,
            description,
            glyph,
            DUE_GLYPH,
            format_date(date)
        ),
        None => format!(
            "* {} {} {} {}",
            OPEN_CHECKBOX,
            description,
            DUE_GLYPH,
            format_date(date)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn task_line_needs_glyph_date_and_open_box() {
        assert!(is_task_line("* [ ] Buy milk 📅 2024-01-01"));
        assert!(is_task_line("- [ ] 📅2024-01-01 Buy milk"));
        assert!(!is_task_line("* [x] Buy milk 📅 2024-01-01"));
        assert!(!is_task_line("* [ ] Buy milk 2024-01-01"));
        assert!(!is_task_line("* [ ] Buy milk 📅 soon"));
        assert!(!is_task_line("Buy milk 📅 2024-01-01"));
    }

    #[test]
    fn due_date_distinguishes_missing_and_invalid() {
        assert_eq!(
            due_date("* [ ] a 📅 2024-06-01"),
            DueDate::On(date("2024-06-01"))
        );
        assert_eq!(due_date("* [ ] a 📅2024-06-01").date(), Some(date("2024-06-01")));
        assert_eq!(due_date("* [ ] a 📅 2024-13-45"), DueDate::Invalid);
        assert_eq!(due_date("* [ ] a 2024-06-01"), DueDate::Missing);
    }

    #[test]
    fn snooze_marker_extraction() {
        let line = "* [ ] Call Bob snz:09:00 📅 2024-06-01";
        assert_eq!(snooze_marker(line), Some("09:00"));
        assert_eq!(snooze_minutes(line), Some(540));
        assert_eq!(snooze_minutes("* [ ] x snz:99:99"), None);
        assert!(!has_snooze("* [ ] x"));
    }

    #[test]
    fn set_due_date_replaces_or_appends() {
        assert_eq!(
            set_due_date("* [ ] a 📅2024-01-01 #home", date("2024-06-02")),
            "* [ ] a 📅 2024-06-02 #home"
        );
        assert_eq!(
            set_due_date("* [ ] a", date("2024-06-02")),
            "* [ ] a 📅 2024-06-02"
        );
    }

    #[test]
    fn set_snooze_replaces_or_appends() {
        assert_eq!(
            set_snooze("* [ ] a snz:09:00 📅 2024-06-01", 13 * 60),
            "* [ ] a snz:13:00 📅 2024-06-01"
        );
        assert_eq!(
            set_snooze("* [ ] a 📅 2024-06-01", 7 * 60 + 5),
            "* [ ] a 📅 2024-06-01 snz:07:05"
        );
    }

    #[test]
    fn strip_snooze_takes_leading_space() {
        assert_eq!(
            strip_snooze("* [ ] a snz:09:00 📅 2024-06-01"),
            "* [ ] a 📅 2024-06-01"
        );
        assert_eq!(
            strip_snooze("* [ ] a 📅 2024-06-01 snz:09:00"),
            "* [ ] a 📅 2024-06-01"
        );
    }

    #[test]
    fn priority_detection() {
        assert_eq!(priority_of("* [ ] a ⏫"), Priority::High);
        assert_eq!(priority_of("* [ ] a 🔽"), Priority::Low);
        assert_eq!(priority_of("* [ ] a"), Priority::Normal);
    }

    #[test]
    fn set_priority_appends_when_absent() {
        assert_eq!(
            set_priority("* [ ] a 📅 2024-06-01", Priority::High),
            "* [ ] a 📅 2024-06-01 ⏫"
        );
    }

    #[test]
    fn set_priority_replaces_in_place() {
        assert_eq!(
            set_priority("* [ ] a ⏫ 📅 2024-06-01", Priority::Low),
            "* [ ] a 🔽 📅 2024-06-01"
        );
    }

    #[test]
    fn set_priority_collapses_duplicates_to_one() {
        let out = set_priority("* [ ] a ⏫ b 🔽 📅 2024-06-01", Priority::High);
        assert_eq!(out, "* [ ] a ⏫ b 📅 2024-06-01");
        assert_eq!(out.matches(HIGH_GLYPH).count(), 1);
        assert!(!out.contains(LOW_GLYPH));
    }

    #[test]
    fn set_priority_normal_strips_all() {
        let out = set_priority("* [ ] a ⏫ 📅 2024-06-01 🔽", Priority::Normal);
        assert_eq!(out, "* [ ] a 📅 2024-06-01");
        assert!(!has_priority(&out));
    }

    #[test]
    fn complete_flips_one_checkbox() {
        assert_eq!(
            complete("* [ ] a [ ] b 📅 2024-06-01"),
            "* [x] a [ ] b 📅 2024-06-01"
        );
    }

    #[test]
    fn add_tag_is_exact_and_idempotent() {
        let once = add_tag("* [ ] a 📅 2024-06-01", "errand");
        assert_eq!(once, "* [ ] a 📅 2024-06-01 #errand");
        assert_eq!(add_tag(&once, "errand"), once);
        assert_eq!(add_tag(&once, "#errand"), once);
        // Case-sensitive match: a differently-cased tag is added
        assert_eq!(add_tag(&once, "Errand"), format!("{} #Errand", once));
        assert_eq!(add_tag(&once, "  "), once);
    }

    #[test]
    fn compose_task_places_markers() {
        assert_eq!(
            compose_task("Buy milk", Priority::Normal, date("2024-06-01")),
            "* [ ] Buy milk 📅 2024-06-01"
        );
        assert_eq!(
            compose_task(" Pay rent ", Priority::High, date("2024-06-01")),
            "* [ ] Pay rent ⏫ 📅 2024-06-01"
        );
        assert!(is_task_line(&compose_task("x", Priority::Low, date("2024-06-01"))));
    }
}
