use std::path::Path;

use serde::Serialize;

use crate::io::usage::UsageCounts;
use crate::model::task::{Priority, TaskLine};
use crate::parse::markers::snooze_marker;
use crate::parse::{DueDate, due_date};
use crate::util::unicode::{display_width, pad_to_width, truncate_to_width};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub file: String,
    /// 1-based, as shown to users
    pub line: usize,
    pub line_index: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snoozed_until: Option<String>,
}

#[derive(Serialize)]
pub struct TaskListJson {
    pub directory: String,
    pub bucket: String,
    pub total: usize,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct ChangeJson {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskJson>,
}

#[derive(Serialize)]
pub struct CountJson {
    pub changed: usize,
}

#[derive(Serialize)]
pub struct UsageJson<'a> {
    pub action: &'a str,
    pub count: u64,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

pub fn task_to_json(task: &TaskLine) -> TaskJson {
    let due = match due_date(&task.text) {
        DueDate::On(d) => Some(d.to_string()),
        _ => None,
    };
    TaskJson {
        file: file_name(&task.path),
        line: task.line_index + 1,
        line_index: task.line_index,
        text: task.text.clone(),
        due,
        priority: task.priority(),
        snoozed_until: snooze_marker(&task.text).map(|s| s.to_string()),
    }
}

pub fn usage_to_json(counts: &UsageCounts) -> Vec<UsageJson<'_>> {
    counts
        .by_frequency()
        .into_iter()
        .map(|(action, count)| UsageJson { action, count })
        .collect()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Strip the list bullet and open checkbox for compact display.
fn display_text(text: &str) -> &str {
    let t = text.trim_start();
    let t = t
        .strip_prefix("* ")
        .or_else(|| t.strip_prefix("- "))
        .unwrap_or(t);
    t.strip_prefix("[ ] ").unwrap_or(t)
}

/// `file:line  text`, with the location column padded to `loc_width`.
pub fn format_task_line(task: &TaskLine, loc_width: usize) -> String {
    let loc = task.key().to_string();
    format!("{}  {}", pad_to_width(&loc, loc_width), display_text(&task.text))
}

/// A listing with aligned location columns.
pub fn format_task_listing(tasks: &[&TaskLine]) -> Vec<String> {
    let width = tasks
        .iter()
        .map(|t| display_width(&t.key().to_string()))
        .max()
        .unwrap_or(0);
    tasks.iter().map(|t| format_task_line(t, width)).collect()
}

/// One row of the review list: cursor marker, row number, text cut to fit.
pub fn format_review_row(row: usize, task: &TaskLine, selected: bool, max_width: usize) -> String {
    let cursor = if selected { ">" } else { " " };
    let prefix = format!("{} {:>3}  ", cursor, row + 1);
    let room = max_width.saturating_sub(display_width(&prefix));
    format!("{}{}", prefix, truncate_to_width(display_text(&task.text), room))
}

pub fn format_usage(counts: &UsageCounts) -> Vec<String> {
    let entries = counts.by_frequency();
    let width = entries
        .iter()
        .map(|(a, _)| display_width(a))
        .max()
        .unwrap_or(0);
    entries
        .into_iter()
        .map(|(action, count)| format!("{}  {}", pad_to_width(action, width), count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn listing_aligns_locations() {
        let a = TaskLine::new("/n/a.md", 0, "* [ ] First ⏫ 📅 2024-06-01");
        let b = TaskLine::new("/n/Work.md", 11, "- [ ] Second 📅 2024-06-01");
        let lines = format_task_listing(&[&a, &b]);
        assert_eq!(
            lines,
            vec![
                "a.md:1      First ⏫ 📅 2024-06-01",
                "Work.md:12  Second 📅 2024-06-01",
            ]
        );
    }

    #[test]
    fn json_carries_markers() {
        let t = TaskLine::new("/n/a.md", 2, "* [ ] Call snz:09:00 🔽 📅 2024-06-01");
        let j = task_to_json(&t);
        assert_eq!(j.file, "a.md");
        assert_eq!(j.line, 3);
        assert_eq!(j.due.as_deref(), Some("2024-06-01"));
        assert_eq!(j.priority, Priority::Low);
        assert_eq!(j.snoozed_until.as_deref(), Some("09:00"));
    }

    #[test]
    fn review_row_truncates() {
        let t = TaskLine::new("a.md", 0, "* [ ] A rather long description 📅 2024-06-01");
        let row = format_review_row(0, &t, true, 20);
        assert_eq!(row, ">   1  A rather lon…");
        assert!(display_width(&row) <= 20);
    }

    #[test]
    fn usage_sorted_by_count() {
        let mut counts = UsageCounts::default();
        counts.increment("1h");
        counts.increment("done");
        counts.increment("done");
        assert_eq!(format_usage(&counts), vec!["done  2", "1h    1"]);
    }
}
