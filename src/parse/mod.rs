pub mod markers;
pub mod scan;

pub use markers::{
    DONE_CHECKBOX, DUE_GLYPH, DueDate, HIGH_GLYPH, LOW_GLYPH, OPEN_CHECKBOX, SNOOZE_PREFIX,
    due_date, is_task_line, priority_of, snooze_minutes,
};
pub use scan::{extract_tasks, is_conflict_name, is_markdown_name};
