use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Task priority, derived from the glyph on the line (if any).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Normal,
    Low,
}

impl Priority {
    /// Sort weight: high floats, low sinks.
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 2,
            Priority::Normal => 1,
            Priority::Low => 0,
        }
    }

    /// The glyph written on the line, or `None` for normal priority.
    pub fn glyph(self) -> Option<&'static str> {
        match self {
            Priority::High => Some(crate::parse::HIGH_GLYPH),
            Priority::Normal => None,
            Priority::Low => Some(crate::parse::LOW_GLYPH),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown priority '{0}' (expected high, low, or none)")]
pub struct ParsePriorityError(String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" | "h" | "⏫" => Ok(Priority::High),
            "low" | "l" | "🔽" => Ok(Priority::Low),
            "none" | "normal" | "remove" => Ok(Priority::Normal),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

/// Identity of a task within one load session: owning file plus the
/// zero-based line index it occupied when the file was read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskKey {
    pub path: PathBuf,
    pub line_index: usize,
}

impl TaskKey {
    pub fn new(path: impl Into<PathBuf>, line_index: usize) -> Self {
        TaskKey {
            path: path.into(),
            line_index,
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.path.to_string_lossy());
        write!(f, "{}:{}", name, self.line_index + 1)
    }
}

/// One open, dated checklist line extracted from a markdown file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLine {
    pub path: PathBuf,
    pub line_index: usize,
    /// Current line text, trailing whitespace trimmed
    pub text: String,
}

impl TaskLine {
    pub fn new(path: impl Into<PathBuf>, line_index: usize, text: impl Into<String>) -> Self {
        TaskLine {
            path: path.into(),
            line_index,
            text: text.into(),
        }
    }

    pub fn key(&self) -> TaskKey {
        TaskKey::new(self.path.clone(), self.line_index)
    }

    pub fn is(&self, key: &TaskKey) -> bool {
        self.line_index == key.line_index && self.path == key.path
    }

    pub fn priority(&self) -> Priority {
        crate::parse::priority_of(&self.text)
    }
}
