use std::path::Path;

use crate::model::task::TaskLine;
use crate::parse::markers::is_task_line;

/// Extract every task line from one file's text, keeping the zero-based
/// line index and trimming trailing whitespace.
pub fn extract_tasks(path: &Path, content: &str) -> Vec<TaskLine> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| is_task_line(line))
        .map(|(idx, line)| TaskLine::new(path, idx, line.trim_end()))
        .collect()
}

/// Sync tools leave copies like `Tasks (conflict 2024-06-01).md` next to
/// the real file.
pub fn is_conflict_name(file_name: &str) -> bool {
    file_name.to_lowercase().contains("conflict")
}

/// Non-hidden file with a markdown extension (any case).
pub fn is_markdown_name(file_name: &str) -> bool {
    if file_name.starts_with('.') {
        return false;
    }
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}
